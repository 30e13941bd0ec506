/// Presentation request storage
use crate::{
    db::models::PresentationRequest,
    error::{RelayError, RelayResult},
    store::new_uuid,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::{types::Json, SqlitePool};

/// A presentation request as returned by the remote verifier
#[derive(Debug, Clone)]
pub struct NewPresentationRequest {
    pub id: String,
    pub verifier_uuid: String,
    pub holder_app_uuid: Option<String>,
    pub metadata: Value,
    pub issuers: Value,
    pub presentation_request: Value,
    pub deeplink: Option<String>,
    pub qr_code: Option<String>,
}

/// Presentation request store
#[derive(Clone)]
pub struct PresentationRequestStore {
    db: SqlitePool,
}

impl PresentationRequestStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewPresentationRequest) -> RelayResult<PresentationRequest> {
        let now = Utc::now();
        let record = PresentationRequest {
            uuid: new_uuid(),
            id: new.id,
            verifier_uuid: new.verifier_uuid,
            holder_app_uuid: new.holder_app_uuid,
            metadata: Json(new.metadata),
            issuers: Json(new.issuers),
            presentation_request: Json(new.presentation_request),
            deeplink: new.deeplink,
            qr_code: new.qr_code,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO presentation_request
                (uuid, id, verifier_uuid, holder_app_uuid, metadata, issuers, presentation_request, deeplink, qr_code, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.uuid)
        .bind(&record.id)
        .bind(&record.verifier_uuid)
        .bind(&record.holder_app_uuid)
        .bind(&record.metadata)
        .bind(&record.issuers)
        .bind(&record.presentation_request)
        .bind(&record.deeplink)
        .bind(&record.qr_code)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.db)
        .await?;

        Ok(record)
    }

    /// Get by local uuid
    pub async fn get(&self, uuid: &str) -> RelayResult<PresentationRequest> {
        sqlx::query_as::<_, PresentationRequest>("SELECT * FROM presentation_request WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| {
                RelayError::NotFound(format!("No presentation request found for uuid {}", uuid))
            })
    }

    /// Get by the identifier the remote verifier assigned
    pub async fn get_by_request_id(&self, id: &str) -> RelayResult<PresentationRequest> {
        sqlx::query_as::<_, PresentationRequest>("SELECT * FROM presentation_request WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| {
                RelayError::NotFound(format!("No presentation request found for id {}", id))
            })
    }

    pub async fn find(&self, verifier_uuid: Option<&str>) -> RelayResult<Vec<PresentationRequest>> {
        let records = sqlx::query_as::<_, PresentationRequest>(
            r#"
            SELECT * FROM presentation_request
            WHERE (?1 IS NULL OR verifier_uuid = ?1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(verifier_uuid)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }
}
