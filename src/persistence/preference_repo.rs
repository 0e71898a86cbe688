//! Key/value preference repository.
//!
//! The durable store shared across process restarts. Each write is a
//! single UPSERT statement, giving per-key atomicity without explicit
//! transactions.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::{AppError, Result};

/// Repository wrapper around the `SQLite` preference table.
#[derive(Clone)]
pub struct PreferenceRepo {
    pool: Arc<SqlitePool>,
}

impl PreferenceRepo {
    /// Create a new repository instance over a shared pool.
    #[must_use]
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Write a string value, replacing any prior value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the write fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO preference (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
             updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    /// Read the value under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM preference WHERE key = ?1")
            .bind(key)
            .fetch_optional(self.pool.as_ref())
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("value")?)),
            None => Ok(None),
        }
    }

    /// Whether any value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the query fails.
    pub async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Remove the value under `key`. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the delete fails.
    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM preference WHERE key = ?1")
            .bind(key)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Serialize `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if serialization or the write fails.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|err| AppError::Store(format!("failed to encode {key}: {err}")))?;
        self.set(key, &raw).await
    }

    /// Read and deserialize the JSON value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Store` if the read fails or the stored value
    /// no longer decodes as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .map_err(|err| AppError::Store(format!("failed to decode {key}: {err}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
