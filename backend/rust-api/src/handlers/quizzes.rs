use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::quiz::{CreateQuizRequest, GenerateQuizRequest},
    services::{
        ai_service::AiService, material_service::MaterialService, quiz_service::QuizService,
        AppState,
    },
};

const DEFAULT_SUBJECT: &str = "Biology";
const DEFAULT_QUESTION_COUNT: usize = 5;
const GENERATION_SOURCE_MATERIALS: i64 = 3;

/// POST /api/v1/quizzes - create a quiz from caller-supplied questions.
pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::validation(format!("Validation error: {}", e)))?;

    let service = QuizService::new(state.mongo.clone());
    let quiz = service.create(&claims.sub, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "quiz": quiz })),
    ))
}

/// GET /api/v1/quizzes - the caller's quizzes, newest first.
pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = QuizService::new(state.mongo.clone());
    let quizzes = service.list(&claims.sub).await?;

    Ok(Json(json!({ "quizzes": quizzes })))
}

/// POST /api/v1/quizzes/generate - build a quiz from the caller's most
/// recent materials for the subject. With no materials on file the static
/// demo quiz is substituted without invoking the generator at all.
pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<GenerateQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subject = req
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    let count = req.num_questions.unwrap_or(DEFAULT_QUESTION_COUNT).max(1);

    let materials = MaterialService::new(state.mongo.clone())
        .recent_for_subject(&claims.sub, &subject, GENERATION_SOURCE_MATERIALS)
        .await?;

    let quiz_service = QuizService::new(state.mongo.clone());
    let title = format!("{} Quiz", subject);

    let quiz = if materials.is_empty() {
        tracing::info!(
            "No materials for user={}, subject={}; serving demo quiz",
            claims.sub,
            subject
        );
        quiz_service
            .create_generated(&claims.sub, title, subject, AiService::demo_questions(), "demo")
            .await?
    } else {
        let combined = materials
            .iter()
            .map(|m| format!("{}: {}", m.title, m.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let questions = state.ai.generate_questions(&combined, &subject, count).await;

        quiz_service
            .create_generated(&claims.sub, title, subject, questions, "generated")
            .await?
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "quiz": quiz })),
    ))
}
