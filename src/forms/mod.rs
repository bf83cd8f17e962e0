pub mod activity;
pub mod auth;
pub mod subtask;

pub use activity::ActivityForm;
pub use auth::{LoginForm, PasswordStrength, RegisterForm, password_strength};
pub use subtask::SubtaskForm;

use crate::error::AppError;

/// Field values that can be checked locally before anything is sent.
pub trait Validate {
    type Output;

    /// Checks the rules in order; the first failure is reported.
    fn validate(&self) -> Result<Self::Output, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Clean,
    Editing,
    Submitting,
    Succeeded,
}

#[derive(Debug, Clone)]
pub struct FormState<F> {
    fields: F,
    phase: FormPhase,
    error: Option<String>,
}

impl<F: Validate> FormState<F> {
    pub fn new(fields: F) -> Self {
        Self {
            fields,
            phase: FormPhase::Clean,
            error: None,
        }
    }

    pub fn fields(&self) -> &F {
        &self.fields
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Any edit clears the previous error.
    pub fn edit(&mut self, change: impl FnOnce(&mut F)) {
        change(&mut self.fields);
        self.phase = FormPhase::Editing;
        self.error = None;
    }

    /// Validates and, if valid, enters `Submitting` and hands back the
    /// request to send. An invalid form stays in `Editing` with its error
    /// and yields nothing to send.
    pub fn begin_submit(&mut self) -> Option<F::Output> {
        if self.phase == FormPhase::Submitting {
            return None;
        }
        self.error = None;
        match self.fields.validate() {
            Ok(output) => {
                self.phase = FormPhase::Submitting;
                Some(output)
            }
            Err(e) => {
                self.phase = FormPhase::Editing;
                self.error = Some(e.user_message());
                None
            }
        }
    }

    pub fn finish<T>(&mut self, result: &Result<T, AppError>) {
        match result {
            Ok(_) => {
                self.phase = FormPhase::Succeeded;
                self.error = None;
            }
            Err(e) => {
                self.phase = FormPhase::Editing;
                self.error = Some(e.user_message());
            }
        }
    }
}

pub(crate) fn required(value: &str, message: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation(message.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}
