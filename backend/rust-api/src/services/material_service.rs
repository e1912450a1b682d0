use anyhow::Context;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::Database;
use uuid::Uuid;

use super::ai_service::AiService;
use crate::error::ApiError;
use crate::metrics::MATERIALS_UPLOADED_TOTAL;
use crate::models::material::{CreateMaterialRequest, StudyMaterial};

pub struct MaterialService {
    mongo: Database,
}

impl MaterialService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Enrich the uploaded text with the AI analysis and embedding, then
    /// store the finished document. Enrichment cannot fail the upload: the
    /// AI service degrades to fallback content on its own.
    pub async fn create(
        &self,
        user_id: &str,
        req: CreateMaterialRequest,
        ai: &AiService,
    ) -> Result<StudyMaterial, ApiError> {
        let analysis = ai.analyze_material(&req.content).await;
        let embedding = ai.embed(&req.content).await;

        let material = StudyMaterial {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: req.title,
            content: req.content,
            subject: req.subject,
            material_type: req.material_type,
            summary: Some(analysis.summary),
            key_topics: Some(analysis.key_topics),
            difficulty: Some(analysis.difficulty),
            embedding: Some(embedding),
            uploaded_at: Utc::now(),
        };

        let collection: mongodb::Collection<StudyMaterial> =
            self.mongo.collection("study_materials");
        collection
            .insert_one(&material)
            .await
            .context("Failed to save study material")?;

        let type_label = serde_json::to_value(material.material_type)
            .ok()
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "other".to_string());
        MATERIALS_UPLOADED_TOTAL
            .with_label_values(&[&type_label])
            .inc();

        tracing::info!(
            "Material {} uploaded: user={}, subject={}",
            material.id,
            material.user_id,
            material.subject
        );

        Ok(material)
    }

    /// List a user's materials, newest first, optionally filtered by subject.
    pub async fn list(
        &self,
        user_id: &str,
        subject: Option<&str>,
    ) -> Result<Vec<StudyMaterial>, ApiError> {
        let mut filter = doc! { "user_id": user_id };
        if let Some(subject) = subject {
            filter.insert("subject", subject);
        }

        let collection: mongodb::Collection<StudyMaterial> =
            self.mongo.collection("study_materials");

        let cursor = collection
            .find(filter)
            .sort(doc! { "uploaded_at": -1 })
            .await?;

        Ok(cursor.try_collect().await?)
    }

    /// The most recent materials for a subject, used as quiz-generation input.
    pub async fn recent_for_subject(
        &self,
        user_id: &str,
        subject: &str,
        limit: i64,
    ) -> Result<Vec<StudyMaterial>, ApiError> {
        let collection: mongodb::Collection<StudyMaterial> =
            self.mongo.collection("study_materials");

        let cursor = collection
            .find(doc! { "user_id": user_id, "subject": subject })
            .sort(doc! { "uploaded_at": -1 })
            .limit(limit)
            .await?;

        Ok(cursor.try_collect().await?)
    }
}
