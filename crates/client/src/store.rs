//! Durable storage for the bearer credential.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use porter_core::{AuthError, AuthResult};

/// Storage key for the single credential slot.
const CREDENTIAL_KEY: &str = "bearer_token";

/// Durable slot for the current bearer token.
///
/// Exactly one opaque token survives process restarts, until logout or a
/// server-side rejection removes it. The token is stored and forwarded
/// verbatim; nothing here inspects it.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> AuthResult<Option<String>>;
    async fn save(&self, token: &str) -> AuthResult<()>;
    async fn clear(&self) -> AuthResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite store
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite-backed credential store (lazy initialization).
///
/// The database is opened and its schema created on first use, so
/// constructing the store is cheap and infallible.
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    path: PathBuf,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Store under the platform data directory.
    pub fn default_location() -> AuthResult<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| AuthError::store("no platform data directory available"))?;
        Ok(Self::new(dir.join("porter").join("credentials.db")))
    }

    async fn pool(&self) -> anyhow::Result<SqlitePool> {
        let mut guard = self.pool.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create credential directory {parent:?}"))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open credential store at {:?}", self.path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                key        TEXT PRIMARY KEY,
                token      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create credentials table")?;

        *guard = Some(pool.clone());
        Ok(pool)
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn load(&self) -> AuthResult<Option<String>> {
        let pool = self.pool().await.map_err(store_err)?;
        let row = sqlx::query("SELECT token FROM credentials WHERE key = ?")
            .bind(CREDENTIAL_KEY)
            .fetch_optional(&pool)
            .await
            .map_err(|err| AuthError::store(err.to_string()))?;
        Ok(row.map(|row| row.get("token")))
    }

    async fn save(&self, token: &str) -> AuthResult<()> {
        let pool = self.pool().await.map_err(store_err)?;
        sqlx::query(
            r#"
            INSERT INTO credentials (key, token, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                token = excluded.token,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(CREDENTIAL_KEY)
        .bind(token)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .map_err(|err| AuthError::store(err.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        let pool = self.pool().await.map_err(store_err)?;
        sqlx::query("DELETE FROM credentials WHERE key = ?")
            .bind(CREDENTIAL_KEY)
            .execute(&pool)
            .await
            .map_err(|err| AuthError::store(err.to_string()))?;
        Ok(())
    }
}

fn store_err(err: anyhow::Error) -> AuthError {
    AuthError::store(format!("{err:#}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory credential slot for tests and for embedders that manage
/// persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> AuthResult<Option<String>> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> AuthResult<()> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save("tok-1").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("tok-1"));

        store.save("tok-2").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("tok-2"));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.db");

        let store = SqliteTokenStore::new(&path);
        store.save("persisted-token").await.unwrap();
        drop(store);

        // A fresh handle on the same path sees the token, as a restarted
        // process would.
        let reopened = SqliteTokenStore::new(&path);
        assert_eq!(
            reopened.load().await.unwrap().as_deref(),
            Some("persisted-token")
        );

        reopened.clear().await.unwrap();
        assert_eq!(reopened.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn sqlite_store_keeps_one_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTokenStore::new(dir.path().join("credentials.db"));

        store.save("first").await.unwrap();
        store.save("second").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("second"));
    }
}
