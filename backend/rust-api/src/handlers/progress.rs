use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::ApiError,
    middlewares::auth::JwtClaims,
    services::{attempt_service::AttemptService, AppState},
};

/// GET /api/v1/progress - the caller's best-score-so-far records, most
/// recently studied first.
pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AttemptService::new(state.mongo.clone());
    let progress = service.list_progress(&claims.sub).await?;

    Ok(Json(json!({ "progress": progress })))
}
