use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Difficulty, MaterialType};

/// A unit of user-supplied study text. Written once at upload (AI enrichment
/// runs before the insert) and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyMaterial {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
    pub summary: Option<String>,
    pub key_topics: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
    /// Opaque embedding vector, stored but never queried.
    pub embedding: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    #[serde(rename = "type")]
    pub material_type: MaterialType,
}

#[derive(Debug, Deserialize)]
pub struct ListMaterialsQuery {
    pub subject: Option<String>,
}
