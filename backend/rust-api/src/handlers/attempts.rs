use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::attempt::{RecordAttemptRequest, RecordAttemptResponse},
    services::{attempt_service::AttemptService, AppState},
};

/// POST /api/v1/quiz-attempts - record a completed attempt and fold its
/// score into the caller's progress for the quiz's subject.
pub async fn record_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<RecordAttemptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::validation(format!("Validation error: {}", e)))?;

    let service = AttemptService::new(state.mongo.clone());
    let attempt = service.record_attempt(&claims.sub, &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordAttemptResponse {
            success: true,
            quiz_attempt: attempt,
        }),
    ))
}
