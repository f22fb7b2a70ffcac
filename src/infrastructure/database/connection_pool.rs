use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct ConnectionPool {
    pool: Arc<SqlitePool>,
}

impl ConnectionPool {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        ensure_parent_dir(options.get_filename())?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(config.connection_timeout.max(1)))
            .connect_with(options)
            .await?;

        tracing::debug!(
            target: "offline::store",
            url = %config.url,
            max_connections = config.max_connections,
            "sqlite pool opened"
        );

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Single-connection in-memory database. The connection is never recycled
    /// so the schema survives for the lifetime of the pool.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn ensure_parent_dir(filename: &Path) -> Result<(), AppError> {
    if filename.as_os_str() == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = filename.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|err| {
            AppError::Storage(format!(
                "failed to create database directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}
