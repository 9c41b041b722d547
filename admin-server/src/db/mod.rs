//! Database Module
//!
//! Read-only access to the back-office store. The schema is owned by the
//! back-office itself; this crate never creates or migrates tables.

pub mod permission_source;

pub use permission_source::SqlitePermissionSource;

use crate::utils::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Database service, owns a SQLite connection pool
#[derive(Clone, Debug)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Connect to an existing database (`sqlite:///path/to/store.db`)
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::database(format!("Invalid database url: {e}")))?
            .create_if_missing(false)
            .read_only(true)
            // 写冲突时等待 5s 而非立即失败 (每个连接生效)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!("Database connection established (SQLite, read-only)");

        Ok(Self { pool })
    }

    /// Permission source backed by this pool
    pub fn permission_source(&self) -> SqlitePermissionSource {
        SqlitePermissionSource::new(self.pool.clone())
    }
}
