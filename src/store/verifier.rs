/// Verifier storage
use crate::{
    db::models::Verifier,
    error::{RelayError, RelayResult},
    store::{base_did, new_uuid},
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

/// Fields of a freshly registered verifier
#[derive(Debug, Clone)]
pub struct NewVerifier {
    pub did: String,
    pub private_key: String,
    pub encryption_private_key: Option<String>,
    pub auth_token: String,
    pub name: String,
    pub company_uuid: String,
}

/// Mutable verifier fields
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifierPatch {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub auth_token: Option<String>,
}

/// Verifier store
#[derive(Clone)]
pub struct VerifierStore {
    db: SqlitePool,
}

impl VerifierStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a verifier
    pub async fn create(&self, new: NewVerifier) -> RelayResult<Verifier> {
        let now = Utc::now();
        let verifier = Verifier {
            uuid: new_uuid(),
            did: base_did(&new.did).to_string(),
            private_key: new.private_key,
            encryption_private_key: new.encryption_private_key,
            auth_token: new.auth_token,
            name: new.name,
            company_uuid: new.company_uuid,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO verifier (uuid, did, private_key, encryption_private_key, auth_token, name, company_uuid, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&verifier.uuid)
        .bind(&verifier.did)
        .bind(&verifier.private_key)
        .bind(&verifier.encryption_private_key)
        .bind(&verifier.auth_token)
        .bind(&verifier.name)
        .bind(&verifier.company_uuid)
        .bind(verifier.created_at)
        .bind(verifier.updated_at)
        .execute(&self.db)
        .await?;

        Ok(verifier)
    }

    /// Get verifier by uuid
    pub async fn get(&self, uuid: &str) -> RelayResult<Verifier> {
        sqlx::query_as::<_, Verifier>("SELECT * FROM verifier WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound(format!("No verifier found for uuid {}", uuid)))
    }

    /// Get verifier by DID; a key fragment on the argument is ignored
    pub async fn get_by_did(&self, did: &str) -> RelayResult<Verifier> {
        let did = base_did(did);
        sqlx::query_as::<_, Verifier>(
            "SELECT * FROM verifier WHERE did = ? ORDER BY created_at ASC LIMIT 1",
        )
        .bind(did)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| RelayError::NotFound(format!("No verifier found for did {}", did)))
    }

    /// List verifiers, optionally filtered by DID
    pub async fn find(&self, did: Option<&str>) -> RelayResult<Vec<Verifier>> {
        let verifiers = sqlx::query_as::<_, Verifier>(
            "SELECT * FROM verifier WHERE (?1 IS NULL OR did = ?1) ORDER BY created_at ASC",
        )
        .bind(did.map(base_did))
        .fetch_all(&self.db)
        .await?;

        Ok(verifiers)
    }

    /// The default verifier used for messaging (the first one registered)
    pub async fn first(&self) -> RelayResult<Verifier> {
        sqlx::query_as::<_, Verifier>("SELECT * FROM verifier ORDER BY created_at ASC LIMIT 1")
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound("No verifier has been registered".to_string()))
    }

    /// Update mutable fields
    pub async fn patch(&self, uuid: &str, patch: VerifierPatch) -> RelayResult<Verifier> {
        let result = sqlx::query(
            r#"
            UPDATE verifier
            SET name = COALESCE(?, name),
                auth_token = COALESCE(?, auth_token),
                updated_at = ?
            WHERE uuid = ?
            "#,
        )
        .bind(patch.name)
        .bind(patch.auth_token)
        .bind(Utc::now())
        .bind(uuid)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RelayError::NotFound(format!("No verifier found for uuid {}", uuid)));
        }

        self.get(uuid).await
    }

    /// Store a token reissued by the remote verifier application
    pub async fn update_auth_token(&self, uuid: &str, auth_token: &str) -> RelayResult<()> {
        self.patch(
            uuid,
            VerifierPatch {
                name: None,
                auth_token: Some(auth_token.to_string()),
            },
        )
        .await?;

        Ok(())
    }
}
