use tracing::warn;

use crate::error::AppError;
use crate::models::{Activity, Progress, Subtask};
use crate::render;
use crate::services::{ActivityService, SubtaskService};

use super::{AppContext, Outcome, Route, finish};

pub async fn show(ctx: &AppContext, id: i64) -> Outcome {
    finish(render_detail(ctx, id).await)
}

async fn render_detail(ctx: &AppContext, id: i64) -> Result<Outcome, AppError> {
    ctx.require_session().await?;

    let mut activity = ActivityService::new(ctx.api.clone(), id);
    let mut subtasks = SubtaskService::new(ctx.api.clone(), Some(id));
    let (loaded, listed) = tokio::join!(activity.load(), subtasks.load());
    loaded?;

    let Some(record) = activity.state().data() else {
        return Err(AppError::NotFound(format!("actividad {}", id)));
    };

    let items = match listed {
        Ok(()) => subtasks.items().to_vec(),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            warn!("using embedded subtasks for activity {}: {}", id, e);
            record.subtasks.clone()
        }
    };

    Ok(Outcome::Render(detail_text(record, &items)))
}

pub(crate) fn detail_text(activity: &Activity, subtasks: &[Subtask]) -> String {
    let mut out = format!(
        "{} {}\nCurso: {}\n",
        render::kind_badge(activity.kind),
        activity.title,
        activity.course
    );
    if let Some(description) = activity.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("{}\n", description));
    }
    if let Some(event) = activity.event_at {
        out.push_str(&format!("Evento: {}\n", event.format("%d/%m/%Y %H:%M")));
    }
    if let Some(due) = activity.due_date {
        out.push_str(&format!("Fecha límite: {}\n", render::short_date(due)));
    }

    out.push('\n');
    out.push_str(&subtask_section(subtasks));
    out.push_str(&format!("\nEditar: {}\n", Route::EditActivity(activity.id)));
    out
}

/// Progress card followed by one line per subtask.
pub(crate) fn subtask_section(subtasks: &[Subtask]) -> String {
    let progress = Progress::of(subtasks);
    let mut out = format!(
        "Progreso: {} de {} subtareas completadas\n{}\n{}\n",
        progress.done,
        progress.total,
        render::progress_bar(progress.percent),
        render::progress_summary(&progress)
    );
    if subtasks.is_empty() {
        out.push_str("Sin subtareas.\n");
    }
    for subtask in subtasks {
        out.push_str(&render::subtask_line(subtask));
        out.push('\n');
    }
    out
}
