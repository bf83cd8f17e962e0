//! Subtask actions on the detail screen. Each one loads the current list,
//! applies the change optimistically and renders the list again.

use crate::error::AppError;
use crate::forms::{SubtaskForm, Validate};
use crate::models::{NewSubtask, SubtaskId, SubtaskStatus};
use crate::render;
use crate::services::SubtaskService;

use super::detail::subtask_section;
use super::{AppContext, Outcome, finish};

async fn loaded(ctx: &AppContext, activity_id: i64) -> Result<SubtaskService, AppError> {
    ctx.require_session().await?;
    let mut service = SubtaskService::new(ctx.api.clone(), Some(activity_id));
    service.load().await?;
    Ok(service)
}

fn updated(service: &SubtaskService, notice: &str) -> Outcome {
    Outcome::Render(format!(
        "{}\n{}",
        render::success_notice(notice),
        subtask_section(service.items())
    ))
}

pub async fn add(ctx: &AppContext, activity_id: i64, fields: SubtaskForm) -> Outcome {
    // Invalid input never reaches the server.
    match fields.validate() {
        Ok(new) => finish(add_subtask(ctx, activity_id, new).await),
        Err(e) => Outcome::Failed(render::error_alert(&e.user_message())),
    }
}

async fn add_subtask(ctx: &AppContext, activity_id: i64, new: NewSubtask) -> Result<Outcome, AppError> {
    let mut service = loaded(ctx, activity_id).await?;
    let name = new.nombre.clone();
    service.add(new).await?;
    Ok(updated(&service, &format!("Subtarea \"{}\" agregada.", name)))
}

pub async fn toggle(ctx: &AppContext, activity_id: i64, subtask_id: i64) -> Outcome {
    finish(toggle_subtask(ctx, activity_id, subtask_id).await)
}

async fn toggle_subtask(ctx: &AppContext, activity_id: i64, subtask_id: i64) -> Result<Outcome, AppError> {
    let mut service = loaded(ctx, activity_id).await?;
    let status = service.toggle(SubtaskId::Remote(subtask_id)).await?;
    Ok(updated(
        &service,
        &format!("Subtarea {} marcada como {}.", subtask_id, status.label()),
    ))
}

pub async fn set_status(
    ctx: &AppContext,
    activity_id: i64,
    subtask_id: i64,
    status: SubtaskStatus,
) -> Outcome {
    finish(change_status(ctx, activity_id, subtask_id, status).await)
}

async fn change_status(
    ctx: &AppContext,
    activity_id: i64,
    subtask_id: i64,
    status: SubtaskStatus,
) -> Result<Outcome, AppError> {
    let mut service = loaded(ctx, activity_id).await?;
    service.set_status(SubtaskId::Remote(subtask_id), status).await?;
    Ok(updated(
        &service,
        &format!("Subtarea {} marcada como {}.", subtask_id, status.label()),
    ))
}

/// Deletes only once the user confirmed; otherwise asks.
pub async fn remove(ctx: &AppContext, activity_id: i64, subtask_id: i64, confirmed: bool) -> Outcome {
    finish(remove_subtask(ctx, activity_id, subtask_id, confirmed).await)
}

async fn remove_subtask(
    ctx: &AppContext,
    activity_id: i64,
    subtask_id: i64,
    confirmed: bool,
) -> Result<Outcome, AppError> {
    let mut service = loaded(ctx, activity_id).await?;
    let id = SubtaskId::Remote(subtask_id);
    let Some(subtask) = service.get(id) else {
        return Err(AppError::NotFound(format!("subtarea {}", id)));
    };
    if !confirmed {
        return Ok(Outcome::Render(format!(
            "¿Seguro que deseas eliminar la subtarea \"{}\"? Repite con --yes para confirmar.",
            subtask.name
        )));
    }
    service.remove(id).await?;
    Ok(updated(&service, "Subtarea eliminada."))
}
