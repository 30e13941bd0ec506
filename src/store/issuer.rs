/// Issuer storage
use crate::{
    db::models::Issuer,
    error::{RelayError, RelayResult},
    store::{base_did, new_uuid},
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

/// Fields of a freshly registered issuer
#[derive(Debug, Clone)]
pub struct NewIssuer {
    pub did: String,
    pub private_key: String,
    pub auth_token: String,
    pub name: String,
    pub company_uuid: String,
}

/// Mutable issuer fields
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssuerPatch {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub auth_token: Option<String>,
}

/// Issuer store
#[derive(Clone)]
pub struct IssuerStore {
    db: SqlitePool,
}

impl IssuerStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert an issuer
    pub async fn create(&self, new: NewIssuer) -> RelayResult<Issuer> {
        let now = Utc::now();
        let issuer = Issuer {
            uuid: new_uuid(),
            did: base_did(&new.did).to_string(),
            private_key: new.private_key,
            auth_token: new.auth_token,
            name: new.name,
            company_uuid: new.company_uuid,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO issuer (uuid, did, private_key, auth_token, name, company_uuid, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&issuer.uuid)
        .bind(&issuer.did)
        .bind(&issuer.private_key)
        .bind(&issuer.auth_token)
        .bind(&issuer.name)
        .bind(&issuer.company_uuid)
        .bind(issuer.created_at)
        .bind(issuer.updated_at)
        .execute(&self.db)
        .await?;

        Ok(issuer)
    }

    /// Get issuer by uuid
    pub async fn get(&self, uuid: &str) -> RelayResult<Issuer> {
        sqlx::query_as::<_, Issuer>("SELECT * FROM issuer WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound(format!("No issuer found for uuid {}", uuid)))
    }

    /// Get issuer by DID; a key fragment on the argument is ignored
    pub async fn get_by_did(&self, did: &str) -> RelayResult<Issuer> {
        let did = base_did(did);
        sqlx::query_as::<_, Issuer>(
            "SELECT * FROM issuer WHERE did = ? ORDER BY created_at ASC LIMIT 1",
        )
        .bind(did)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| RelayError::NotFound(format!("No issuer found for did {}", did)))
    }

    /// List issuers, optionally filtered by DID
    pub async fn find(&self, did: Option<&str>) -> RelayResult<Vec<Issuer>> {
        let issuers = sqlx::query_as::<_, Issuer>(
            "SELECT * FROM issuer WHERE (?1 IS NULL OR did = ?1) ORDER BY created_at ASC",
        )
        .bind(did.map(base_did))
        .fetch_all(&self.db)
        .await?;

        Ok(issuers)
    }

    /// The earliest registered issuer
    pub async fn first(&self) -> RelayResult<Issuer> {
        sqlx::query_as::<_, Issuer>("SELECT * FROM issuer ORDER BY created_at ASC LIMIT 1")
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound("No issuer has been registered".to_string()))
    }

    /// Update mutable fields
    pub async fn patch(&self, uuid: &str, patch: IssuerPatch) -> RelayResult<Issuer> {
        let result = sqlx::query(
            r#"
            UPDATE issuer
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
            return Err(RelayError::NotFound(format!("No issuer found for uuid {}", uuid)));
        }

        self.get(uuid).await
    }

    /// Store a token reissued by the remote issuer application
    pub async fn update_auth_token(&self, uuid: &str, auth_token: &str) -> RelayResult<()> {
        self.patch(
            uuid,
            IssuerPatch {
                name: None,
                auth_token: Some(auth_token.to_string()),
            },
        )
        .await?;

        Ok(())
    }
}
