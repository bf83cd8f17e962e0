use crate::error::AppError;
use crate::models::{LoginRequest, RegisterRequest};

use super::{Validate, required};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl Validate for LoginForm {
    type Output = LoginRequest;

    fn validate(&self) -> Result<LoginRequest, AppError> {
        let username = required(&self.username, "Por favor ingresa tu nombre de usuario.")?;
        if self.password.is_empty() {
            return Err(AppError::Validation("Por favor ingresa tu contraseña.".to_string()));
        }
        Ok(LoginRequest {
            username,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for RegisterForm {
    type Output = RegisterRequest;

    fn validate(&self) -> Result<RegisterRequest, AppError> {
        let username = required(&self.username, "Por favor ingresa un nombre de usuario.")?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "La contraseña debe tener al menos {} caracteres.",
                MIN_PASSWORD_LEN
            )));
        }
        if self.password != self.confirm_password {
            return Err(AppError::Validation(
                "Las contraseñas no coinciden. Verifica e intenta de nuevo.".to_string(),
            ));
        }
        Ok(RegisterRequest {
            username,
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    VeryWeak,
    Weak,
    Good,
    Strong,
}

impl PasswordStrength {
    pub fn label(&self) -> &'static str {
        match self {
            PasswordStrength::VeryWeak => "Muy débil",
            PasswordStrength::Weak => "Débil",
            PasswordStrength::Good => "Buena",
            PasswordStrength::Strong => "Fuerte",
        }
    }
}

/// Scores length, letters, digits and symbols; `None` for an empty password.
pub fn password_strength(password: &str) -> Option<PasswordStrength> {
    if password.is_empty() {
        return None;
    }
    let checks = [
        password.chars().count() >= MIN_PASSWORD_LEN,
        password.chars().any(|c| c.is_ascii_alphabetic()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = checks.iter().filter(|c| **c).count();

    Some(match score {
        0 | 1 => PasswordStrength::VeryWeak,
        2 => PasswordStrength::Weak,
        3 => PasswordStrength::Good,
        _ => PasswordStrength::Strong,
    })
}
