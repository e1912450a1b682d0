use serde::{Deserialize, Serialize};

pub mod attempt;
pub mod material;
pub mod progress;
pub mod quiz;
pub mod study_plan;
pub mod user;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    Notes,
    Textbook,
    Article,
    Handout,
    Other,
}
