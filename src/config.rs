use std::env;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SESSION_DATABASE_URL: &str = "sqlite://session.db";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub session_database_url: String,
}

impl ApiConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let base_url = lookup("API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "API_URL must start with http:// or https://, got {}",
                base_url
            )));
        }

        let session_database_url = lookup("SESSION_DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_DATABASE_URL.to_string());

        Ok(Self {
            base_url,
            session_database_url,
        })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_database_url: DEFAULT_SESSION_DATABASE_URL.to_string(),
        }
    }
}
