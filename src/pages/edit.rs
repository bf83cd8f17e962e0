use tracing::info;

use crate::error::AppError;
use crate::forms::{ActivityForm, FormState};
use crate::render;
use crate::services::ActivityService;

use super::{AppContext, Outcome, Route, finish};

/// Fields the user changed on the edit screen; `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct ActivityEdits {
    pub titulo: Option<String>,
    pub tipo: Option<String>,
    pub curso: Option<String>,
    pub descripcion: Option<String>,
    pub fecha_evento: Option<String>,
    pub fecha_limite: Option<String>,
}

impl ActivityEdits {
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none()
            && self.tipo.is_none()
            && self.curso.is_none()
            && self.descripcion.is_none()
            && self.fecha_evento.is_none()
            && self.fecha_limite.is_none()
    }

    fn apply(self, form: &mut ActivityForm) {
        let fields = [
            (self.titulo, &mut form.titulo),
            (self.tipo, &mut form.tipo),
            (self.curso, &mut form.curso),
            (self.descripcion, &mut form.descripcion),
            (self.fecha_evento, &mut form.fecha_evento),
            (self.fecha_limite, &mut form.fecha_limite),
        ];
        for (edit, field) in fields {
            if let Some(value) = edit {
                *field = value;
            }
        }
    }
}

pub async fn edit(ctx: &AppContext, id: i64, edits: ActivityEdits) -> Outcome {
    finish(save_edits(ctx, id, edits).await)
}

async fn save_edits(ctx: &AppContext, id: i64, edits: ActivityEdits) -> Result<Outcome, AppError> {
    ctx.require_session().await?;

    let mut service = ActivityService::new(ctx.api.clone(), id);
    service.load().await?;
    let Some(loaded) = service.state().data() else {
        return Err(AppError::NotFound(format!("actividad {}", id)));
    };

    let mut form = FormState::new(ActivityForm::from_activity(loaded));
    if edits.is_empty() {
        return Ok(Outcome::Render(render::success_notice("No hay cambios que guardar.")));
    }
    form.edit(|fields| edits.apply(fields));

    let Some(payload) = form.begin_submit() else {
        return Ok(Outcome::Failed(render::error_alert(form.error().unwrap_or_default())));
    };
    let result = service.replace(&payload).await;
    form.finish(&result);
    result?;

    Ok(Outcome::redirect(
        Route::Activity(id),
        render::success_notice("Los cambios fueron guardados con éxito."),
    ))
}

/// Deletes only once the user confirmed; otherwise asks.
pub async fn delete(ctx: &AppContext, id: i64, confirmed: bool) -> Outcome {
    finish(delete_activity(ctx, id, confirmed).await)
}

async fn delete_activity(ctx: &AppContext, id: i64, confirmed: bool) -> Result<Outcome, AppError> {
    ctx.require_session().await?;
    if !confirmed {
        return Ok(Outcome::Render(format!(
            "¿Seguro que deseas eliminar la actividad #{}? Esta acción no se puede deshacer. Repite con --yes para confirmar.",
            id
        )));
    }

    let mut service = ActivityService::new(ctx.api.clone(), id);
    service.delete().await?;
    info!("activity {} removed by user", id);
    Ok(Outcome::redirect(
        Route::Activities,
        render::success_notice("Actividad eliminada."),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::memory::{ApiCall, Failure, InMemoryApi};
    use crate::models::SubtaskStatus;
    use crate::pages::testing::logged_in;

    #[tokio::test]
    async fn replaces_the_whole_record() {
        let api = Arc::new(InMemoryApi::new());
        let id = api.seed_activity("Taller", "2024-02-01");
        let ctx = logged_in(api.clone()).await;

        let outcome = edit(
            &ctx,
            id,
            ActivityEdits {
                titulo: Some("Taller de bases de datos".into()),
                fecha_limite: Some("2024-02-20".into()),
                ..Default::default()
            },
        )
        .await;
        assert!(outcome.redirects_to(Route::Activity(id)));

        let payload = api
            .calls()
            .into_iter()
            .find_map(|c| match c {
                ApiCall::ReplaceActivity(_, payload) => Some(payload),
                _ => None,
            })
            .unwrap();
        assert_eq!(payload.titulo, "Taller de bases de datos");
        assert_eq!(payload.curso, "General");
        assert_eq!(api.activity(id).unwrap().title, "Taller de bases de datos");
    }

    #[tokio::test]
    async fn invalid_edit_is_not_sent() {
        let api = Arc::new(InMemoryApi::new());
        let id = api.seed_activity("Taller", "2024-02-01");
        let ctx = logged_in(api.clone()).await;

        let outcome = edit(
            &ctx,
            id,
            ActivityEdits {
                curso: Some("  ".into()),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(outcome, Outcome::Failed("✖ El curso es obligatorio.".into()));
        assert!(!api.calls().iter().any(|c| matches!(c, ApiCall::ReplaceActivity(..))));
    }

    #[tokio::test]
    async fn delete_needs_confirmation() {
        let api = Arc::new(InMemoryApi::new());
        let id = api.seed_activity("Taller", "2024-02-01");
        api.seed_subtask(id, "Leer", SubtaskStatus::Pending);
        let ctx = logged_in(api.clone()).await;

        assert!(matches!(delete(&ctx, id, false).await, Outcome::Render(_)));
        assert!(api.calls().is_empty());

        assert!(delete(&ctx, id, true).await.redirects_to(Route::Activities));
        assert!(api.activity(id).is_none());
        assert!(api.subtasks_of(id).is_empty());
    }

    #[tokio::test]
    async fn failed_delete_is_inline() {
        let api = Arc::new(InMemoryApi::new());
        let id = api.seed_activity("Taller", "2024-02-01");
        api.fail_next(Failure::Status(500));
        let ctx = logged_in(api.clone()).await;

        assert!(matches!(delete(&ctx, id, true).await, Outcome::Failed(_)));
        assert!(api.activity(id).is_some());
    }
}
