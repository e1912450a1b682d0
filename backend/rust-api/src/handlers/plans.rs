use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::ApiError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::study_plan::GeneratePlanRequest,
    services::{material_service::MaterialService, AppState},
};

const DEFAULT_PLAN_DAYS: u32 = 7;

/// POST /api/v1/study-plans/generate - build a study schedule from the
/// caller's materials. Plans are returned directly and not persisted.
pub async fn generate_plan(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<GeneratePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let duration_days = req.duration_days.unwrap_or(DEFAULT_PLAN_DAYS).max(1);

    let materials = MaterialService::new(state.mongo.clone())
        .list(&claims.sub, None)
        .await?;

    let plan = state.ai.generate_study_plan(&materials, duration_days).await;

    Ok(Json(json!({ "plan": plan })))
}
