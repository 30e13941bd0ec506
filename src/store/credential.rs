/// Issued and shared credential storage
use crate::{
    db::models::{IssuedCredential, SharedCredential},
    error::{RelayError, RelayResult},
    store::new_uuid,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::{types::Json, SqliteExecutor, SqlitePool};

/// Credential issued by `issuer_uuid` to `user_uuid`
#[derive(Debug, Clone)]
pub struct NewIssuedCredential {
    pub issuer_uuid: String,
    pub user_uuid: String,
    pub credential: Value,
}

/// Credential shared with `verifier_uuid`
#[derive(Debug, Clone)]
pub struct NewSharedCredential {
    pub issuer_uuid: String,
    pub verifier_uuid: String,
    pub user_uuid: String,
    pub credential: Value,
}

/// Credential store
#[derive(Clone)]
pub struct CredentialStore {
    db: SqlitePool,
}

impl CredentialStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Record a credential our issuer issued
    pub async fn create_issued(&self, new: NewIssuedCredential) -> RelayResult<IssuedCredential> {
        let now = Utc::now();
        let record = IssuedCredential {
            uuid: new_uuid(),
            issuer_uuid: new.issuer_uuid,
            user_uuid: new.user_uuid,
            credential: Json(new.credential),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO issued_credential (uuid, issuer_uuid, user_uuid, credential, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.uuid)
        .bind(&record.issuer_uuid)
        .bind(&record.user_uuid)
        .bind(&record.credential)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.db)
        .await?;

        Ok(record)
    }

    pub async fn get_issued(&self, uuid: &str) -> RelayResult<IssuedCredential> {
        sqlx::query_as::<_, IssuedCredential>("SELECT * FROM issued_credential WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| {
                RelayError::NotFound(format!("No issued credential found for uuid {}", uuid))
            })
    }

    /// List issued credentials, optionally filtered by issuer and/or user
    pub async fn find_issued(
        &self,
        issuer_uuid: Option<&str>,
        user_uuid: Option<&str>,
    ) -> RelayResult<Vec<IssuedCredential>> {
        let records = sqlx::query_as::<_, IssuedCredential>(
            r#"
            SELECT * FROM issued_credential
            WHERE (?1 IS NULL OR issuer_uuid = ?1)
              AND (?2 IS NULL OR user_uuid = ?2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(issuer_uuid)
        .bind(user_uuid)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    /// Record a credential that was shared with one of our verifiers
    pub async fn create_shared(&self, new: NewSharedCredential) -> RelayResult<SharedCredential> {
        let record = shared_record(new);
        insert_shared(&self.db, &record).await?;
        Ok(record)
    }

    /// Record every credential of one presentation, all or none
    pub async fn create_shared_all(
        &self,
        batch: Vec<NewSharedCredential>,
    ) -> RelayResult<Vec<SharedCredential>> {
        let mut tx = self.db.begin().await?;
        let mut records = Vec::with_capacity(batch.len());
        for new in batch {
            let record = shared_record(new);
            insert_shared(&mut *tx, &record).await?;
            records.push(record);
        }
        tx.commit().await?;

        Ok(records)
    }

    pub async fn get_shared(&self, uuid: &str) -> RelayResult<SharedCredential> {
        sqlx::query_as::<_, SharedCredential>("SELECT * FROM shared_credential WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| {
                RelayError::NotFound(format!("No shared credential found for uuid {}", uuid))
            })
    }

    /// List shared credentials, optionally filtered by verifier and/or user
    pub async fn find_shared(
        &self,
        verifier_uuid: Option<&str>,
        user_uuid: Option<&str>,
    ) -> RelayResult<Vec<SharedCredential>> {
        let records = sqlx::query_as::<_, SharedCredential>(
            r#"
            SELECT * FROM shared_credential
            WHERE (?1 IS NULL OR verifier_uuid = ?1)
              AND (?2 IS NULL OR user_uuid = ?2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(verifier_uuid)
        .bind(user_uuid)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }
}

fn shared_record(new: NewSharedCredential) -> SharedCredential {
    let now = Utc::now();
    SharedCredential {
        uuid: new_uuid(),
        issuer_uuid: new.issuer_uuid,
        verifier_uuid: new.verifier_uuid,
        user_uuid: new.user_uuid,
        credential: Json(new.credential),
        created_at: now,
        updated_at: now,
    }
}

async fn insert_shared<'e, E>(executor: E, record: &SharedCredential) -> RelayResult<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO shared_credential (uuid, issuer_uuid, verifier_uuid, user_uuid, credential, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.uuid)
    .bind(&record.issuer_uuid)
    .bind(&record.verifier_uuid)
    .bind(&record.user_uuid)
    .bind(&record.credential)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}
