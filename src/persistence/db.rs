//! `SQLite` connection and schema bootstrap for the preference store.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::{AppError, Result};

/// Single-table schema: one namespaced key per preference entry.
/// Writes are single-statement UPSERTs, so each key is updated
/// atomically and a restart never observes a half-written value.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS preference (\
     key TEXT PRIMARY KEY, \
     value TEXT NOT NULL, \
     updated_at TEXT NOT NULL)";

/// Open (creating if needed) the file-backed preference store.
///
/// # Errors
///
/// Returns `AppError::Store` if the directory cannot be created or the
/// connection/schema application fails.
pub async fn connect(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| AppError::Store(format!("failed to create state dir: {err}")))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;
    apply_schema(&pool).await?;
    Ok(pool)
}

/// Open an in-memory preference store for tests.
///
/// The pool is pinned to a single connection so every query sees the
/// same in-memory database.
///
/// # Errors
///
/// Returns `AppError::Store` if the connection or schema application fails.
pub async fn connect_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(AppError::from)?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    apply_schema(&pool).await?;
    Ok(pool)
}

async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA).execute(pool).await?;
    Ok(())
}
