pub mod store;

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{Session, SessionKey};

pub use store::{MemorySessionStore, SessionStore, SqliteSessionStore};

/// The one place that mutates the persisted session.
///
/// Reads always go to the store, so a token cleared by one request is
/// never served from a stale in-memory copy to the next.
#[derive(Clone)]
pub struct SessionHandle {
    store: Arc<dyn SessionStore>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn access_token(&self) -> Result<Option<String>, AppError> {
        self.store.get(SessionKey::AccessToken).await
    }

    pub async fn username(&self) -> Result<Option<String>, AppError> {
        self.store.get(SessionKey::Username).await
    }

    pub async fn is_active(&self) -> Result<bool, AppError> {
        Ok(self.access_token().await?.is_some())
    }

    pub async fn current(&self) -> Result<Option<Session>, AppError> {
        let Some(access_token) = self.store.get(SessionKey::AccessToken).await? else {
            return Ok(None);
        };
        let refresh_token = self.store.get(SessionKey::RefreshToken).await?.unwrap_or_default();
        let username = self.store.get(SessionKey::Username).await?.unwrap_or_default();

        Ok(Some(Session {
            access_token,
            refresh_token,
            username,
        }))
    }

    pub async fn start(&self, session: &Session) -> Result<(), AppError> {
        self.store.set(SessionKey::AccessToken, &session.access_token).await?;
        self.store.set(SessionKey::RefreshToken, &session.refresh_token).await?;
        self.store.set(SessionKey::Username, &session.username).await?;
        info!("session started for {}", session.username);
        Ok(())
    }

    pub async fn end(&self) -> Result<(), AppError> {
        for key in SessionKey::ALL {
            self.store.remove(key).await?;
        }
        info!("session ended");
        Ok(())
    }

    /// Handles a 401 for a request that carried `rejected_token`.
    ///
    /// The session is cleared only while that token is still the stored
    /// one; a login that happened while the request was in flight survives.
    /// Returns whether anything was cleared.
    pub async fn expire(&self, rejected_token: &str) -> Result<bool, AppError> {
        let cleared = self.store.clear_if(rejected_token).await?;
        if cleared {
            warn!("access token rejected by server, session cleared");
        } else {
            warn!("stale access token rejected, newer session kept");
        }
        Ok(cleared)
    }
}
