use serde::{Deserialize, Serialize};

/// A generated study schedule. Plans are returned to the caller as-is and
/// not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    pub title: String,
    pub description: String,
    pub tasks: Vec<StudyTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyTask {
    pub title: String,
    pub description: String,
    /// Estimated minutes for the task.
    pub estimated_time: u32,
    pub method: String,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePlanRequest {
    pub duration_days: Option<u32>,
}
