use tracing::{info, warn};

use crate::error::AppError;
use crate::forms::{ActivityForm, FormState, SubtaskForm, Validate};
use crate::models::NewSubtask;
use crate::render;
use crate::services::SubtaskService;

use super::{AppContext, Outcome, Route, finish};

pub async fn create(ctx: &AppContext, fields: ActivityForm, drafts: Vec<SubtaskForm>) -> Outcome {
    finish(create_activity(ctx, fields, drafts).await)
}

async fn create_activity(
    ctx: &AppContext,
    fields: ActivityForm,
    drafts: Vec<SubtaskForm>,
) -> Result<Outcome, AppError> {
    ctx.require_session().await?;

    let mut form = FormState::new(fields);
    let Some(payload) = form.begin_submit() else {
        return Ok(Outcome::Failed(render::error_alert(form.error().unwrap_or_default())));
    };
    let new_subtasks = match validate_drafts(&drafts) {
        Ok(new_subtasks) => new_subtasks,
        Err(message) => return Ok(Outcome::Failed(render::error_alert(&message))),
    };

    let result = ctx.api.create_activity(&payload).await;
    form.finish(&result);
    let activity = result?;
    info!("created activity {} ({})", activity.id, activity.title);

    let mut subtasks = SubtaskService::new(ctx.api.clone(), None);
    for new in new_subtasks {
        subtasks.add(new).await?;
    }
    let expected = subtasks.items().len();
    let created = subtasks.attach(activity.id).await?;

    let notice = if created == expected {
        render::success_notice(&format!("Actividad \"{}\" creada con éxito.", activity.title))
    } else {
        warn!(
            "only {} of {} subtasks were saved for activity {}",
            created, expected, activity.id
        );
        render::error_alert(&format!(
            "La actividad se creó, pero solo se guardaron {} de {} subtareas.",
            created, expected
        ))
    };
    Ok(Outcome::redirect(Route::Activities, notice))
}

/// Every drafted subtask must be valid before anything is created.
fn validate_drafts(drafts: &[SubtaskForm]) -> Result<Vec<NewSubtask>, String> {
    drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| {
            draft
                .validate()
                .map_err(|e| format!("Subtarea {}: {}", i + 1, e.user_message()))
        })
        .collect()
}
