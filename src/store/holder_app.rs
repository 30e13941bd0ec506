/// Holder app storage
use crate::{
    db::models::HolderApp,
    error::{RelayError, RelayResult},
    store::new_uuid,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

/// Fields required to create a holder app
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewHolderApp {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "uriScheme is required"))]
    pub uri_scheme: String,
    pub deeplink_button_img: Option<String>,
}

/// Holder app store
#[derive(Clone)]
pub struct HolderAppStore {
    db: SqlitePool,
}

impl HolderAppStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewHolderApp) -> RelayResult<HolderApp> {
        let now = Utc::now();
        let app = HolderApp {
            uuid: new_uuid(),
            name: new.name,
            uri_scheme: new.uri_scheme,
            deeplink_button_img: new.deeplink_button_img,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO holder_app (uuid, name, uri_scheme, deeplink_button_img, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&app.uuid)
        .bind(&app.name)
        .bind(&app.uri_scheme)
        .bind(&app.deeplink_button_img)
        .bind(app.created_at)
        .bind(app.updated_at)
        .execute(&self.db)
        .await?;

        Ok(app)
    }

    pub async fn get(&self, uuid: &str) -> RelayResult<HolderApp> {
        sqlx::query_as::<_, HolderApp>("SELECT * FROM holder_app WHERE uuid = ?")
            .bind(uuid)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| RelayError::NotFound(format!("No holder app found for uuid {}", uuid)))
    }

    pub async fn find(&self) -> RelayResult<Vec<HolderApp>> {
        let apps =
            sqlx::query_as::<_, HolderApp>("SELECT * FROM holder_app ORDER BY created_at ASC")
                .fetch_all(&self.db)
                .await?;

        Ok(apps)
    }
}
