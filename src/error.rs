use thiserror::Error;
use tracing::error;

use crate::api::decode::DecodeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Sesión expirada. Inicia sesión de nuevo.")]
    SessionExpired,

    #[error("No hay una sesión activa. Inicia sesión.")]
    NoSession,

    #[error("Usuario o contraseña incorrectos. Verifica tus datos e intenta de nuevo.")]
    InvalidCredentials,

    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("No se pudo conectar al servidor. Revisa tu conexión a internet.")]
    Connectivity(String),

    #[error("No encontrado: {0}")]
    NotFound(String),

    #[error("Respuesta inválida del servidor: {0}")]
    Decode(#[from] DecodeError),

    #[error("Session storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Errors that send the user back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, AppError::SessionExpired | AppError::NoSession)
    }

    pub fn request(status: u16, server_message: Option<String>, fallback: &str) -> Self {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        AppError::Request { status, message }
    }

    /// Message shown inline on a page. Internal failures are logged and
    /// replaced by a generic text.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Storage(e) => {
                error!("session storage error: {}", e);
                "Error interno al acceder a la sesión.".to_string()
            }
            AppError::Config(e) => {
                error!("configuration error: {}", e);
                "Error de configuración.".to_string()
            }
            other => other.to_string(),
        }
    }
}
