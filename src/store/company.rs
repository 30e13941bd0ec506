/// Company storage
use crate::{
    db::models::Company,
    error::{RelayError, RelayResult},
    store::new_uuid,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

/// Fields required to create a company
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(alias = "unumIdApiKey")]
    #[validate(length(min = 1, message = "apiKey is required"))]
    pub api_key: String,
    #[serde(alias = "unumIdCustomerUuid")]
    #[validate(length(min = 1, message = "customerUuid is required"))]
    pub customer_uuid: String,
}

/// Mutable company fields
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub api_key: Option<String>,
}

/// Company store
#[derive(Clone)]
pub struct CompanyStore {
    db: SqlitePool,
}

impl CompanyStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a company
    pub async fn create(&self, new: NewCompany) -> RelayResult<Company> {
        let now = Utc::now();
        let company = Company {
            uuid: new_uuid(),
            name: new.name,
            api_key: new.api_key,
            customer_uuid: new.customer_uuid,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO company (uuid, name, api_key, customer_uuid, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&company.uuid)
        .bind(&company.name)
        .bind(&company.api_key)
        .bind(&company.customer_uuid)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.db)
        .await?;

        Ok(company)
    }

    /// Get company by uuid
    pub async fn get(&self, uuid: &str) -> RelayResult<Company> {
        sqlx::query_as::<_, Company>("SELECT * FROM company WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound(format!("No company found for uuid {}", uuid)))
    }

    /// List all companies, oldest first
    pub async fn find(&self) -> RelayResult<Vec<Company>> {
        let companies =
            sqlx::query_as::<_, Company>("SELECT * FROM company ORDER BY created_at ASC")
                .fetch_all(&self.db)
                .await?;

        Ok(companies)
    }

    /// The company that owns this deployment (the first one created)
    pub async fn first(&self) -> RelayResult<Company> {
        sqlx::query_as::<_, Company>("SELECT * FROM company ORDER BY created_at ASC LIMIT 1")
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound("No company has been created".to_string()))
    }

    /// Update mutable fields
    pub async fn patch(&self, uuid: &str, patch: CompanyPatch) -> RelayResult<Company> {
        let result = sqlx::query(
            r#"
            UPDATE company
            SET name = COALESCE(?, name),
                api_key = COALESCE(?, api_key),
                updated_at = ?
            WHERE uuid = ?
            "#,
        )
        .bind(patch.name)
        .bind(patch.api_key)
        .bind(Utc::now())
        .bind(uuid)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RelayError::NotFound(format!("No company found for uuid {}", uuid)));
        }

        self.get(uuid).await
    }
}
