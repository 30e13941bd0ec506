/// Database layer for the credential relay
///
/// Manages the SQLite connection pool and embedded migrations. Row types
/// shared by the stores live in [`models`].

pub mod models;

use crate::error::{RelayError, RelayResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Create a SQLite connection pool
///
/// In-memory databases live inside a single connection, so they are pinned
/// to one connection that is never recycled.
pub async fn create_pool(url: &str, options: DatabaseOptions) -> RelayResult<SqlitePool> {
    let in_memory = is_memory_url(url);

    let mut connect = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    if !in_memory {
        if let Some(parent) = connect.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        connect = connect.journal_mode(if options.enable_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        });
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(options.max_connections)
    };

    let pool = pool_options
        .connect_with(connect)
        .await
        .map_err(RelayError::Database)?;

    Ok(pool)
}

/// Run migrations for a database
/// Migrations are embedded at compile time from ./migrations directory
pub async fn run_migrations(pool: &SqlitePool) -> RelayResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| RelayError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> RelayResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(RelayError::Database)?;

    Ok(())
}

/// Open a migrated in-memory database
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = create_pool("sqlite::memory:", DatabaseOptions::default())
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
