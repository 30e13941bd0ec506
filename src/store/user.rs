/// User storage
use crate::{
    db::models::User,
    error::{RelayError, RelayResult},
    store::{base_did, new_uuid},
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

/// Fields required to create a user
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, message = "did must not be empty"))]
    pub did: Option<String>,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "companyUuid is required"))]
    pub company_uuid: String,
}

/// Mutable user fields
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub did: Option<String>,
}

/// User store
#[derive(Clone)]
pub struct UserStore {
    db: SqlitePool,
}

impl UserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a user
    pub async fn create(&self, new: NewUser) -> RelayResult<User> {
        let now = Utc::now();
        let user = User {
            uuid: new_uuid(),
            did: new.did.as_deref().map(|d| base_did(d).to_string()),
            name: new.name,
            company_uuid: new.company_uuid,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO user (uuid, did, name, company_uuid, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.uuid)
        .bind(&user.did)
        .bind(&user.name)
        .bind(&user.company_uuid)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await?;

        Ok(user)
    }

    /// Get user by uuid
    pub async fn get(&self, uuid: &str) -> RelayResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM user WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound(format!("No user found for uuid {}", uuid)))
    }

    /// Get user by DID; a key fragment on the argument is ignored
    pub async fn get_by_did(&self, did: &str) -> RelayResult<User> {
        let did = base_did(did);
        sqlx::query_as::<_, User>("SELECT * FROM user WHERE did = ? ORDER BY created_at ASC LIMIT 1")
            .bind(did)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound(format!("No user found for did {}", did)))
    }

    /// List users, optionally filtered by DID
    pub async fn find(&self, did: Option<&str>) -> RelayResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM user WHERE (?1 IS NULL OR did = ?1) ORDER BY created_at ASC",
        )
        .bind(did.map(base_did))
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// Update mutable fields
    pub async fn patch(&self, uuid: &str, patch: UserPatch) -> RelayResult<User> {
        let result = sqlx::query(
            r#"
            UPDATE user
            SET name = COALESCE(?, name),
                did = COALESCE(?, did),
                updated_at = ?
            WHERE uuid = ?
            "#,
        )
        .bind(patch.name)
        .bind(patch.did.as_deref().map(base_did))
        .bind(Utc::now())
        .bind(uuid)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RelayError::NotFound(format!("No user found for uuid {}", uuid)));
        }

        self.get(uuid).await
    }
}
