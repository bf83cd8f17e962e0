use crate::error::AppError;

use super::{AppContext, Outcome, finish};

pub async fn show(ctx: &AppContext) -> Outcome {
    finish(welcome(ctx).await)
}

async fn welcome(ctx: &AppContext) -> Result<Outcome, AppError> {
    ctx.require_session().await?;
    let greeting = match ctx.session.username().await? {
        Some(name) if !name.is_empty() => format!("¡Bienvenido, {}!", name),
        _ => "¡Bienvenido!".to_string(),
    };
    Ok(Outcome::Render(format!(
        "{} Hoy es un gran día para ser productivo.",
        greeting
    )))
}
