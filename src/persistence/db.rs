//! `SQLite` connection pool setup.

use std::fs;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::{AppError, GlobalConfig, Result};

use super::schema;

/// Open (creating if needed) the file-backed store and apply the schema.
///
/// # Errors
///
/// Returns `AppError::Db` if the directory, connection, or schema step fails.
pub async fn connect(config: &GlobalConfig) -> Result<SqlitePool> {
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| AppError::Db(format!("failed to create db dir: {err}")))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    schema::bootstrap_schema(&pool).await?;
    info!(path = %db_path.display(), "store opened");
    Ok(pool)
}

/// Open a private in-memory database.
///
/// The pool is capped at one connection that never expires because every
/// `SQLite` memory connection is its own database.
///
/// # Errors
///
/// Returns `AppError::Db` if the connection or schema step fails.
pub async fn connect_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    schema::bootstrap_schema(&pool).await?;
    Ok(pool)
}
