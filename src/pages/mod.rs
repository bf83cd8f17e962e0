pub mod activities;
pub mod auth;
pub mod create;
pub mod detail;
pub mod edit;
pub mod subtasks;
pub mod today;

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::api::ActivityApi;
use crate::error::AppError;
use crate::render;
use crate::session::SessionHandle;

/// What every screen gets injected.
#[derive(Clone)]
pub struct AppContext {
    pub api: Arc<dyn ActivityApi>,
    pub session: SessionHandle,
}

impl AppContext {
    pub fn new(api: Arc<dyn ActivityApi>, session: SessionHandle) -> Self {
        Self { api, session }
    }

    /// Protected screens call this first; no token means no request at all.
    pub(crate) async fn require_session(&self) -> Result<(), AppError> {
        if self.session.is_active().await? {
            Ok(())
        } else {
            Err(AppError::NoSession)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Today,
    Activities,
    CreateActivity,
    Activity(i64),
    EditActivity(i64),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Today => "/hoy".to_string(),
            Route::Activities => "/MisActividades".to_string(),
            Route::CreateActivity => "/CrearActividad".to_string(),
            Route::Activity(id) => format!("/actividad/{}", id),
            Route::EditActivity(id) => format!("/actividad/{}/editar", id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render(String),
    /// The screen stays where it is and shows the error inline.
    Failed(String),
    Redirect { to: Route, notice: Option<String> },
}

impl Outcome {
    pub fn redirect(to: Route, notice: impl Into<String>) -> Self {
        Outcome::Redirect {
            to,
            notice: Some(notice.into()),
        }
    }

    pub fn redirects_to(&self, route: Route) -> bool {
        matches!(self, Outcome::Redirect { to, .. } if *to == route)
    }
}

/// Maps a page's error into what the user sees: auth problems go to the
/// login screen, everything else is shown inline.
pub(crate) fn finish(result: Result<Outcome, AppError>) -> Outcome {
    match result {
        Ok(outcome) => outcome,
        Err(e) if e.requires_login() => {
            warn!("redirecting to login: {}", e);
            Outcome::redirect(Route::Login, render::error_alert(&e.to_string()))
        }
        Err(e) => Outcome::Failed(render::error_alert(&e.user_message())),
    }
}
