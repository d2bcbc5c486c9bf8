//! Key-value persistence boundary.
//!
//! Every persisted value (quota, record collections, settings) is a JSON
//! document under a fixed key. [`KeyValueStore`] is the seam; the daemon
//! uses [`SqliteKvStore`], `--ephemeral` runs and tests use
//! [`MemoryKvStore`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

use crate::{AppError, Result};

/// Boxed future returned by [`KeyValueStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Persisted get/set of JSON values that survives restarts.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>>;

    /// Replace the value stored under `key`.
    fn set<'a>(&'a self, key: &'a str, value: Value) -> StoreFuture<'a, ()>;
}

/// Load `key` as `T`, falling back to `default` when the entry is missing
/// or does not decode.
///
/// # Errors
///
/// Returns `AppError::Db` only when the store itself fails.
pub async fn load_or<T, F>(store: &dyn KeyValueStore, key: &str, default: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match store.get(key).await? {
        None => Ok(default()),
        Some(value) => match serde_json::from_value(value) {
            Ok(decoded) => Ok(decoded),
            Err(err) => {
                warn!(key, %err, "malformed stored value, using default");
                Ok(default())
            }
        },
    }
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
///
/// Returns `AppError::MalformedData` if serialization fails or
/// `AppError::Db` if the write fails.
pub async fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_value(value)?;
    store.set(key, json).await
}

/// `SQLite`-backed store using the `kv_entry` table.
#[derive(Clone)]
pub struct SqliteKvStore {
    db: Arc<SqlitePool>,
}

impl SqliteKvStore {
    /// Create a new store over an already-bootstrapped pool.
    #[must_use]
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            let row: Option<(String,)> =
                sqlx::query_as("SELECT value FROM kv_entry WHERE key = ?1")
                    .bind(key)
                    .fetch_optional(self.db.as_ref())
                    .await?;

            Ok(row.and_then(|(raw,)| match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key, %err, "stored value is not valid json");
                    None
                }
            }))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let raw = serde_json::to_string(&value)?;
            let updated_at = Utc::now().to_rfc3339();
            sqlx::query(
                "INSERT INTO kv_entry (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                 updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(&raw)
            .bind(&updated_at)
            .execute(self.db.as_ref())
            .await?;
            Ok(())
        })
    }
}

/// Process-local store; contents vanish on exit.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
        Box::pin(async move {
            let guard = self
                .entries
                .lock()
                .map_err(|_| AppError::Db("memory store mutex poisoned".into()))?;
            Ok(guard.get(key).cloned())
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut guard = self
                .entries
                .lock()
                .map_err(|_| AppError::Db("memory store mutex poisoned".into()))?;
            guard.insert(key.to_owned(), value);
            Ok(())
        })
    }
}
