use anyhow::Context;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::QUIZZES_CREATED_TOTAL;
use crate::models::quiz::{CreateQuizRequest, Question, QuestionInput, Quiz};

pub struct QuizService {
    mongo: Database,
}

impl QuizService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Create a quiz from caller-supplied questions. Every question must
    /// carry exactly 4 options with the correct answer among them.
    pub async fn create(&self, user_id: &str, req: CreateQuizRequest) -> Result<Quiz, ApiError> {
        let questions = req
            .questions
            .into_iter()
            .map(validate_question)
            .collect::<Result<Vec<_>, _>>()?;

        let quiz = self
            .insert_quiz(user_id, req.title, req.subject, questions, "manual")
            .await?;
        Ok(quiz)
    }

    /// Persist a quiz whose questions came out of the generator (already
    /// shape-checked there).
    pub async fn create_generated(
        &self,
        user_id: &str,
        title: String,
        subject: String,
        questions: Vec<Question>,
        source: &str,
    ) -> Result<Quiz, ApiError> {
        self.insert_quiz(user_id, title, subject, questions, source)
            .await
    }

    /// List a user's quizzes, newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Quiz>, ApiError> {
        let collection: mongodb::Collection<Quiz> = self.mongo.collection("quizzes");

        let cursor = collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn insert_quiz(
        &self,
        user_id: &str,
        title: String,
        subject: String,
        questions: Vec<Question>,
        source: &str,
    ) -> Result<Quiz, ApiError> {
        let quiz = Quiz {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title,
            subject,
            questions,
            created_at: Utc::now(),
        };

        let collection: mongodb::Collection<Quiz> = self.mongo.collection("quizzes");
        collection
            .insert_one(&quiz)
            .await
            .context("Failed to save quiz")?;

        QUIZZES_CREATED_TOTAL.with_label_values(&[source]).inc();

        tracing::info!(
            "Quiz {} created: user={}, subject={}, questions={}",
            quiz.id,
            quiz.user_id,
            quiz.subject,
            quiz.questions.len()
        );

        Ok(quiz)
    }
}

fn validate_question(input: QuestionInput) -> Result<Question, ApiError> {
    if input.options.len() != 4 {
        return Err(ApiError::validation(format!(
            "question \"{}\" must have exactly 4 options",
            input.question
        )));
    }
    if !input.options.contains(&input.correct_answer) {
        return Err(ApiError::validation(format!(
            "correct answer for \"{}\" must be one of its options",
            input.question
        )));
    }

    Ok(Question {
        question: input.question,
        options: input.options,
        correct_answer: input.correct_answer,
        explanation: input.explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(options: Vec<&str>, correct: &str) -> QuestionInput {
        QuestionInput {
            question: "q".to_string(),
            options: options.into_iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.to_string(),
            explanation: None,
        }
    }

    #[test]
    fn accepts_well_formed_question() {
        let q = validate_question(input(vec!["a", "b", "c", "d"], "c")).unwrap();
        assert_eq!(q.correct_answer, "c");
    }

    #[test]
    fn rejects_wrong_option_count() {
        assert!(validate_question(input(vec!["a", "b", "c"], "a")).is_err());
    }

    #[test]
    fn rejects_correct_answer_outside_options() {
        assert!(validate_question(input(vec!["a", "b", "c", "d"], "e")).is_err());
    }
}
