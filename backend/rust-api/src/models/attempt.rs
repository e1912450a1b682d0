use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One completed run through a quiz. Attempts are an append-only log: rows
/// are never updated or deleted once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    #[serde(rename = "_id")]
    pub id: String,
    pub quiz_id: String,
    pub user_id: String,
    pub score: i32,
    /// Serialized answer record as submitted by the caller.
    pub answers: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordAttemptRequest {
    #[validate(length(min = 1, message = "quiz_id is required"))]
    pub quiz_id: String,
    #[validate(range(min = 0, max = 100, message = "score must be between 0 and 100"))]
    pub score: i32,
    pub answers: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct RecordAttemptResponse {
    pub success: bool,
    pub quiz_attempt: QuizAttempt,
}
