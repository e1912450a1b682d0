use anyhow::Context;
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::Database;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics::ATTEMPTS_RECORDED_TOTAL;
use crate::models::attempt::{QuizAttempt, RecordAttemptRequest};
use crate::models::progress::Progress;
use crate::models::quiz::Quiz;
use crate::utils::retry::{retry_async, RetryConfig};

/// Records completed quiz attempts and folds them into per-(user, subject)
/// progress. This is the one path in the system with shared mutable state:
/// concurrent attempts race on the progress document, so the aggregation is
/// a single atomic `$max`/`$set` upsert rather than a read-modify-write.
pub struct AttemptService {
    mongo: Database,
}

impl AttemptService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Persist an attempt and aggregate it into progress.
    ///
    /// The attempt insert and the progress upsert are two independent writes,
    /// not a transaction: an attempt is kept even when the referenced quiz
    /// does not exist, in which case the aggregation step is skipped without
    /// surfacing an error.
    pub async fn record_attempt(
        &self,
        user_id: &str,
        req: &RecordAttemptRequest,
    ) -> Result<QuizAttempt, ApiError> {
        let answers = req
            .answers
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        let attempt = QuizAttempt {
            id: Uuid::new_v4().to_string(),
            quiz_id: req.quiz_id.clone(),
            user_id: user_id.to_string(),
            score: req.score,
            answers: serde_json::to_string(&answers)
                .context("Failed to serialize attempt answers")?,
            created_at: Utc::now(),
        };

        self.insert_attempt(&attempt).await?;

        match self.quiz_subject(&attempt.quiz_id).await? {
            Some(subject) => {
                self.upsert_progress(user_id, &subject, attempt.score)
                    .await?;
                ATTEMPTS_RECORDED_TOTAL.with_label_values(&["true"]).inc();
            }
            None => {
                tracing::warn!(
                    "Quiz {} not found, attempt {} recorded without progress update",
                    attempt.quiz_id,
                    attempt.id
                );
                ATTEMPTS_RECORDED_TOTAL.with_label_values(&["false"]).inc();
            }
        }

        Ok(attempt)
    }

    /// List a user's progress records, most recently studied first.
    pub async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, ApiError> {
        use futures::TryStreamExt;

        let collection: mongodb::Collection<Progress> = self.mongo.collection("progress");

        let cursor = collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "last_studied": -1 })
            .await?;

        Ok(cursor.try_collect().await?)
    }

    // Append-only: attempts are only ever inserted, never updated or deleted.
    async fn insert_attempt(&self, attempt: &QuizAttempt) -> Result<(), ApiError> {
        let collection: mongodb::Collection<QuizAttempt> = self.mongo.collection("quiz_attempts");

        retry_async(RetryConfig::default(), || async {
            collection.insert_one(attempt).await.map(|_| ())
        })
        .await
        .context("Failed to save quiz attempt")?;

        tracing::info!(
            "Attempt {} recorded: user={}, quiz={}, score={}",
            attempt.id,
            attempt.user_id,
            attempt.quiz_id,
            attempt.score
        );
        Ok(())
    }

    async fn quiz_subject(&self, quiz_id: &str) -> Result<Option<String>, ApiError> {
        let collection: mongodb::Collection<Quiz> = self.mongo.collection("quizzes");

        let quiz = collection.find_one(doc! { "_id": quiz_id }).await?;
        Ok(quiz.map(|q| q.subject))
    }

    // `$max` keeps the score monotonically non-decreasing while `$set`
    // refreshes the timestamp unconditionally, all in one atomic update, so
    // two concurrent attempts cannot lose the higher of their scores.
    async fn upsert_progress(
        &self,
        user_id: &str,
        subject: &str,
        score: i32,
    ) -> Result<(), ApiError> {
        let collection: mongodb::Collection<Progress> = self.mongo.collection("progress");
        let progress_id = Progress::key(user_id, subject);

        let now =
            mongodb::bson::to_bson(&Utc::now()).context("Failed to encode progress timestamp")?;

        let update = doc! {
            "$max": { "score": score },
            "$set": { "last_studied": now },
            "$setOnInsert": { "user_id": user_id, "subject": subject },
        };

        retry_async(RetryConfig::default(), || async {
            collection
                .update_one(doc! { "_id": &progress_id }, update.clone())
                .with_options(
                    mongodb::options::UpdateOptions::builder()
                        .upsert(true)
                        .build(),
                )
                .await
                .map(|_| ())
        })
        .await
        .context("Failed to upsert progress")?;

        tracing::info!(
            "Progress updated: user={}, subject={}, attempt score={}",
            user_id,
            subject,
            score
        );
        Ok(())
    }
}
