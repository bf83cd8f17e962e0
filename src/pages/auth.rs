use tracing::info;

use crate::error::AppError;
use crate::forms::{FormState, LoginForm, RegisterForm, password_strength};
use crate::models::Session;
use crate::render;

use super::{AppContext, Outcome, Route, finish};

pub async fn login(ctx: &AppContext, fields: LoginForm) -> Outcome {
    let mut form = FormState::new(fields);
    let Some(req) = form.begin_submit() else {
        return Outcome::Failed(render::error_alert(form.error().unwrap_or_default()));
    };

    let result = ctx.api.login(&req).await;
    form.finish(&result);
    let tokens = match result {
        Ok(tokens) => tokens,
        // A rejected login is a form error, not an expired session.
        Err(_) => return Outcome::Failed(render::error_alert(form.error().unwrap_or_default())),
    };

    let session = Session {
        access_token: tokens.access,
        refresh_token: tokens.refresh,
        username: req.username,
    };
    finish(start_session(ctx, &session).await)
}

async fn start_session(ctx: &AppContext, session: &Session) -> Result<Outcome, AppError> {
    ctx.session.start(session).await?;
    Ok(Outcome::redirect(
        Route::Today,
        render::success_notice(&format!("Sesión iniciada como {}.", session.username)),
    ))
}

pub async fn register(ctx: &AppContext, fields: RegisterForm) -> Outcome {
    let strength = password_strength(&fields.password);
    let mut form = FormState::new(fields);
    let Some(req) = form.begin_submit() else {
        return Outcome::Failed(render::error_alert(form.error().unwrap_or_default()));
    };

    let result = ctx.api.register(&req).await;
    form.finish(&result);
    match result {
        Ok(()) => {
            info!("account created for {}", req.username);
            let mut notice = render::success_notice("¡Cuenta creada! Ya puedes iniciar sesión.");
            if let Some(strength) = strength {
                notice.push_str(&format!(" Fortaleza de la contraseña: {}.", strength.label()));
            }
            Outcome::redirect(Route::Login, notice)
        }
        Err(_) => Outcome::Failed(render::error_alert(form.error().unwrap_or_default())),
    }
}

pub async fn logout(ctx: &AppContext) -> Outcome {
    finish(
        ctx.session
            .end()
            .await
            .map(|_| Outcome::redirect(Route::Login, render::success_notice("Sesión cerrada."))),
    )
}
