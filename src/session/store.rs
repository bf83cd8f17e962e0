use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::error::AppError;
use crate::models::SessionKey;

/// Client-persistent key/value storage for the session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, AppError>;
    async fn set(&self, key: SessionKey, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: SessionKey) -> Result<(), AppError>;
    /// Removes every session key, but only while the stored access token is
    /// `access_token`. Returns whether the session was cleared.
    async fn clear_if(&self, access_token: &str) -> Result<bool, AppError>;
}

pub struct SqliteSessionStore {
    db: SqlitePool,
}

impl SqliteSessionStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // An in-memory database lives as long as its single connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(db: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .map_err(|e| AppError::Storage(e.into()))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM session_entries WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.db)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: SessionKey, value: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO session_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .bind(now)
        .execute(&self.db)
        .await?;
        debug!("stored session key {}", key.as_str());
        Ok(())
    }

    async fn remove(&self, key: SessionKey) -> Result<(), AppError> {
        sqlx::query("DELETE FROM session_entries WHERE key = ?")
            .bind(key.as_str())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn clear_if(&self, access_token: &str) -> Result<bool, AppError> {
        let mut tx = self.db.begin().await?;

        let affected = sqlx::query("DELETE FROM session_entries WHERE key = ?1 AND value = ?2")
            .bind(SessionKey::AccessToken.as_str())
            .bind(access_token)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM session_entries WHERE key IN (?1, ?2)")
            .bind(SessionKey::RefreshToken.as_str())
            .bind(SessionKey::Username.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SessionKey, String>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::Config("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: SessionKey) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(&key).cloned())
    }

    async fn set(&self, key: SessionKey, value: &str) -> Result<(), AppError> {
        self.lock()?.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: SessionKey) -> Result<(), AppError> {
        self.lock()?.remove(&key);
        Ok(())
    }

    async fn clear_if(&self, access_token: &str) -> Result<bool, AppError> {
        let mut entries = self.lock()?;
        if entries.get(&SessionKey::AccessToken).map(String::as_str) != Some(access_token) {
            return Ok(false);
        }
        entries.clear();
        Ok(true)
    }
}
