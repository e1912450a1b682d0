use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::material::{CreateMaterialRequest, ListMaterialsQuery},
    services::{material_service::MaterialService, AppState},
};

/// POST /api/v1/materials - upload study material; summary, key topics,
/// difficulty and embedding are filled in by the AI service before the
/// insert.
pub async fn create_material(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateMaterialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::validation(format!("Validation error: {}", e)))?;

    let service = MaterialService::new(state.mongo.clone());
    let material = service.create(&claims.sub, req, &state.ai).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "material": material })),
    ))
}

/// GET /api/v1/materials?subject= - the caller's materials, newest first.
pub async fn list_materials(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<ListMaterialsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = MaterialService::new(state.mongo.clone());
    let materials = service.list(&claims.sub, query.subject.as_deref()).await?;

    Ok(Json(json!({ "materials": materials })))
}
