use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best-score-so-far record per (user, subject). The composite `_id` keeps
/// at most one document per pair; `score` only ever increases while
/// `last_studied` is refreshed on every attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub score: i32,
    pub last_studied: DateTime<Utc>,
}

impl Progress {
    pub fn key(user_id: &str, subject: &str) -> String {
        format!("{}:{}", user_id, subject)
    }
}
