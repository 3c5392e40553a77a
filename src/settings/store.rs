//! Key/value settings store
//!
//! Settings documents are addressed by `(namespace, key)` and stored as
//! JSON text. The SQLite backend uses sqlx with native async support.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Asynchronous key/value store for JSON-serialized settings values.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<Value>>;

    async fn set(&self, namespace: &str, key: &str, value: &Value) -> StoreResult<()>;

    async fn delete(&self, namespace: &str, key: &str) -> StoreResult<()>;
}

/// SQLite-backed settings store.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Opens (or creates) `settings.db` inside `dir`.
    pub async fn open(dir: &Path) -> StoreResult<Self> {
        let file = dir.join("settings.db");
        let options = SqliteConnectOptions::new()
            .filename(&file)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        info!("Settings store ready: {}", file.display());
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS settings (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (namespace, key)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<Value>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM settings WHERE namespace = ?1 AND key = ?2")
                .bind(namespace)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((text,)) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, namespace: &str, key: &str, value: &Value) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO settings (namespace, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (namespace, key)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(namespace)
        .bind(key)
        .bind(text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(namespace, key, "Settings value written");
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM settings WHERE namespace = ?1 AND key = ?2")
            .bind(namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
