use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::metrics::record_provider_outcome;
use crate::models::material::StudyMaterial;
use crate::models::quiz::Question;
use crate::models::study_plan::{StudyPlan, StudyTask};
use crate::models::Difficulty;

const PROVIDER_TIMEOUT_SECS: u64 = 10;
const DEMO_EMBEDDING: &str = "[0.1,0.2,0.3,0.4,0.5]";

/// Internal failure kinds of the AI provider. None of these ever reach a
/// handler: every public operation resolves them to fallback content.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("unparsable provider response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaterialAnalysis {
    pub summary: String,
    pub key_topics: Vec<String>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
struct QuestionBatch {
    questions: Vec<Question>,
}

/// Client for the external text-reasoning provider. Owns its HTTP client and
/// is constructed once by the process entry point, then injected through
/// `AppState` into every operation that needs it.
pub struct AiService {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl AiService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_url: config.ai_api_url.clone(),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
        })
    }

    /// False when no usable API key is configured; all operations then serve
    /// canned demo content.
    pub fn is_live(&self) -> bool {
        matches!(&self.api_key, Some(key) if key != "demo-key")
    }

    /// Summarize study material, extract key topics and rate its difficulty.
    /// Never fails: provider errors degrade to a static analysis. Empty or
    /// whitespace-only input is accepted.
    pub async fn analyze_material(&self, content: &str) -> MaterialAnalysis {
        if !self.is_live() {
            record_provider_outcome("analyze_material", "demo");
            return Self::demo_analysis();
        }

        let prompt = format!(
            "Analyze the following study material and provide:\n\
             1. A concise summary (2-3 sentences)\n\
             2. 5-8 key topics as a JSON array\n\
             3. Difficulty level (beginner/intermediate/advanced)\n\n\
             Study material:\n{}\n\n\
             Respond with JSON only:\n\
             {{\"summary\": \"brief summary\", \"key_topics\": [\"topic1\", \"topic2\"], \
             \"difficulty\": \"beginner|intermediate|advanced\"}}",
            content
        );

        match self.request_json::<MaterialAnalysis>(&prompt, 0.3).await {
            Ok(analysis) => {
                record_provider_outcome("analyze_material", "ok");
                analysis
            }
            Err(e) => {
                self.log_provider_failure("analyze_material", &e);
                record_provider_outcome("analyze_material", "fallback");
                Self::fallback_analysis()
            }
        }
    }

    /// Generate multiple-choice questions from combined source text. `count`
    /// is a target, not a guarantee: malformed provider output is discarded
    /// question by question and the result may be as small as one question.
    /// Never fails.
    pub async fn generate_questions(
        &self,
        content: &str,
        subject: &str,
        count: usize,
    ) -> Vec<Question> {
        if !self.is_live() {
            record_provider_outcome("generate_questions", "demo");
            return Self::demo_questions();
        }

        let prompt = format!(
            "Create {} multiple choice questions based on this study material.\n\
             Subject: {}\n\n\
             Study material:\n{}\n\n\
             For each question provide the question text, 4 options, the correct \
             answer (repeat the full text of the correct option) and a brief \
             explanation.\n\n\
             Respond with JSON only:\n\
             {{\"questions\": [{{\"question\": \"...\", \"options\": [\"...\", \"...\", \
             \"...\", \"...\"], \"correct_answer\": \"...\", \"explanation\": \"...\"}}]}}",
            count, subject, content
        );

        match self.request_json::<QuestionBatch>(&prompt, 0.7).await {
            Ok(batch) => {
                let questions = Self::sanitize_questions(batch.questions, count);
                if questions.is_empty() {
                    tracing::warn!("Provider returned no usable questions, serving fallback");
                    record_provider_outcome("generate_questions", "fallback");
                    Self::fallback_questions()
                } else {
                    record_provider_outcome("generate_questions", "ok");
                    questions
                }
            }
            Err(e) => {
                self.log_provider_failure("generate_questions", &e);
                record_provider_outcome("generate_questions", "fallback");
                Self::fallback_questions()
            }
        }
    }

    /// Generate a day-by-day study plan from the user's materials. Never fails.
    pub async fn generate_study_plan(
        &self,
        materials: &[StudyMaterial],
        duration_days: u32,
    ) -> StudyPlan {
        if !self.is_live() {
            record_provider_outcome("generate_study_plan", "demo");
            return Self::demo_plan(duration_days);
        }

        let materials_text = materials
            .iter()
            .map(|m| {
                let excerpt: String = m.content.chars().take(500).collect();
                format!("{} ({}): {}...", m.title, m.subject, excerpt)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Create a {}-day study plan based on these materials:\n{}\n\n\
             For each day provide a specific task, estimated time in minutes \
             (30-120) and a study method (reading, practice, review).\n\n\
             Respond with JSON only:\n\
             {{\"title\": \"Study Plan Title\", \"description\": \"brief description\", \
             \"tasks\": [{{\"title\": \"Day 1: Topic\", \"description\": \"what to do\", \
             \"estimated_time\": 60, \"method\": \"reading\"}}]}}",
            duration_days, materials_text
        );

        match self.request_json::<StudyPlan>(&prompt, 0.5).await {
            Ok(plan) => {
                record_provider_outcome("generate_study_plan", "ok");
                plan
            }
            Err(e) => {
                self.log_provider_failure("generate_study_plan", &e);
                record_provider_outcome("generate_study_plan", "fallback");
                Self::demo_plan(duration_days)
            }
        }
    }

    /// Produce an opaque embedding string for later storage. The value is
    /// never queried, so a canned vector is fine as the fallback.
    pub async fn embed(&self, text: &str) -> String {
        if !self.is_live() {
            record_provider_outcome("embed", "demo");
            return DEMO_EMBEDDING.to_string();
        }

        match self.request_embedding(text).await {
            Ok(embedding) => {
                record_provider_outcome("embed", "ok");
                embedding
            }
            Err(e) => {
                self.log_provider_failure("embed", &e);
                record_provider_outcome("embed", "fallback");
                DEMO_EMBEDDING.to_string()
            }
        }
    }

    // One fallback branch for all recoverable provider failures; credential
    // problems are logged at error level so misconfiguration stays visible.
    fn log_provider_failure(&self, operation: &str, err: &ProviderError) {
        match err {
            ProviderError::Status(status)
                if *status == reqwest::StatusCode::UNAUTHORIZED
                    || *status == reqwest::StatusCode::FORBIDDEN =>
            {
                tracing::error!(
                    "AI provider rejected credentials during {}: {} (check OPENAI_API_KEY)",
                    operation,
                    err
                );
            }
            _ => {
                tracing::warn!(
                    "AI provider failure during {}, serving fallback: {}",
                    operation,
                    err
                );
            }
        }
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<T, ProviderError> {
        let content = self.chat(prompt, temperature).await?;
        serde_json::from_str(extract_json(&content))
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    async fn chat(&self, prompt: &str, temperature: f32) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.api_url);

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": temperature,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body: serde_json::Value = response.json().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ProviderError::Malformed("missing message content".to_string()))
    }

    async fn request_embedding(&self, text: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1/embeddings", self.api_url);

        let body = json!({
            "model": "text-embedding-3-small",
            "input": text,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body: serde_json::Value = response.json().await?;
        let embedding = body["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| ProviderError::Malformed("missing embedding vector".to_string()))?;

        serde_json::to_string(embedding).map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    /// Drop questions that violate the question shape (exactly 4 options,
    /// correct answer drawn from them) and truncate to the requested count.
    fn sanitize_questions(questions: Vec<Question>, count: usize) -> Vec<Question> {
        questions
            .into_iter()
            .filter(|q| {
                let valid = q.options.len() == 4 && q.options.contains(&q.correct_answer);
                if !valid {
                    tracing::warn!("Discarding malformed generated question: {:?}", q.question);
                }
                valid
            })
            .take(count)
            .collect()
    }

    fn demo_analysis() -> MaterialAnalysis {
        MaterialAnalysis {
            summary: "This study material covers key concepts in the subject area with \
                      important topics and definitions."
                .to_string(),
            key_topics: vec![
                "Topic 1".to_string(),
                "Topic 2".to_string(),
                "Topic 3".to_string(),
                "Topic 4".to_string(),
                "Topic 5".to_string(),
            ],
            difficulty: Difficulty::Intermediate,
        }
    }

    fn fallback_analysis() -> MaterialAnalysis {
        MaterialAnalysis {
            summary: "This study material covers key concepts in the subject area.".to_string(),
            key_topics: vec![
                "Topic 1".to_string(),
                "Topic 2".to_string(),
                "Topic 3".to_string(),
            ],
            difficulty: Difficulty::Intermediate,
        }
    }

    /// The static two-question quiz served in demo mode. Also substituted by
    /// the generation endpoint when the user has no materials for a subject.
    pub fn demo_questions() -> Vec<Question> {
        vec![
            Question {
                question: "What is the main topic covered in this material?".to_string(),
                options: vec![
                    "Advanced mathematics".to_string(),
                    "Basic concepts".to_string(),
                    "Historical events".to_string(),
                    "Scientific principles".to_string(),
                ],
                correct_answer: "Basic concepts".to_string(),
                explanation: Some(
                    "The material focuses on fundamental concepts and principles.".to_string(),
                ),
            },
            Question {
                question: "Which of the following is most important for understanding this subject?"
                    .to_string(),
                options: vec![
                    "Memorization".to_string(),
                    "Critical thinking".to_string(),
                    "Speed reading".to_string(),
                    "Note taking".to_string(),
                ],
                correct_answer: "Critical thinking".to_string(),
                explanation: Some(
                    "Critical thinking is essential for understanding complex concepts."
                        .to_string(),
                ),
            },
        ]
    }

    fn fallback_questions() -> Vec<Question> {
        vec![Question {
            question: "What is the main topic covered in this material?".to_string(),
            options: vec![
                "Advanced mathematics".to_string(),
                "Basic concepts".to_string(),
                "Historical events".to_string(),
                "Scientific principles".to_string(),
            ],
            correct_answer: "Basic concepts".to_string(),
            explanation: Some(
                "The material focuses on fundamental concepts and principles.".to_string(),
            ),
        }]
    }

    fn demo_plan(duration_days: u32) -> StudyPlan {
        StudyPlan {
            title: format!("{}-Day Study Plan", duration_days),
            description: "A personalized study schedule based on your materials".to_string(),
            tasks: vec![
                StudyTask {
                    title: "Day 1: Review Key Concepts".to_string(),
                    description: "Read through the main topics and take notes".to_string(),
                    estimated_time: 60,
                    method: "reading".to_string(),
                },
                StudyTask {
                    title: "Day 2: Practice Problems".to_string(),
                    description: "Work on practice questions and exercises".to_string(),
                    estimated_time: 45,
                    method: "practice".to_string(),
                },
                StudyTask {
                    title: "Day 3: Quiz Preparation".to_string(),
                    description: "Review and prepare for upcoming quizzes".to_string(),
                    estimated_time: 30,
                    method: "review".to_string(),
                },
            ],
        }
    }
}

/// Providers often wrap JSON answers in Markdown code fences; strip them.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}
