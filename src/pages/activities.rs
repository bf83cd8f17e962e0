use crate::error::AppError;
use crate::render;
use crate::services::ActivityListService;

use super::{AppContext, Outcome, finish};

pub async fn list(ctx: &AppContext) -> Outcome {
    finish(render_list(ctx).await)
}

async fn render_list(ctx: &AppContext) -> Result<Outcome, AppError> {
    ctx.require_session().await?;
    let mut service = ActivityListService::new(ctx.api.clone());
    service.load().await?;

    let activities = service.state().data().map(Vec::as_slice).unwrap_or_default();
    if activities.is_empty() {
        return Ok(Outcome::Render("No tienes actividades todavía.".to_string()));
    }

    let mut out = format!("Mis actividades ({})\n", activities.len());
    for activity in activities {
        out.push_str(&render::activity_row(activity));
        out.push('\n');
    }
    Ok(Outcome::Render(out))
}
