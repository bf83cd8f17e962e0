use crate::api::decode::{parse_date, parse_date_time};
use crate::error::AppError;
use crate::models::{Activity, ActivityKind, ActivityPayload};

use super::{Validate, required};

/// Raw input of the create/edit activity screens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityForm {
    pub titulo: String,
    pub tipo: String,
    pub curso: String,
    pub descripcion: String,
    pub fecha_evento: String,
    pub fecha_limite: String,
}

impl ActivityForm {
    /// Prefills the edit screen from a loaded record.
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            titulo: activity.title.clone(),
            tipo: activity.kind.as_str().to_string(),
            curso: activity.course.clone(),
            descripcion: activity.description.clone().unwrap_or_default(),
            fecha_evento: activity
                .event_at
                .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
                .unwrap_or_default(),
            fecha_limite: activity
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

impl Validate for ActivityForm {
    type Output = ActivityPayload;

    fn validate(&self) -> Result<ActivityPayload, AppError> {
        let titulo = required(&self.titulo, "El título es obligatorio.")?;
        let curso = required(&self.curso, "El curso es obligatorio.")?;

        let tipo = if self.tipo.trim().is_empty() {
            ActivityKind::default()
        } else {
            self.tipo
                .parse::<ActivityKind>()
                .map_err(|_| AppError::Validation(format!("Tipo de actividad desconocido: {}", self.tipo)))?
        };

        let fecha_evento = match self.fecha_evento.trim() {
            "" => None,
            raw => Some(
                parse_date_time(raw)
                    .ok_or_else(|| AppError::Validation("La fecha del evento no es válida.".to_string()))?,
            ),
        };
        let fecha_limite = match self.fecha_limite.trim() {
            "" => None,
            raw => Some(
                parse_date(raw)
                    .ok_or_else(|| AppError::Validation("La fecha límite no es válida.".to_string()))?,
            ),
        };

        Ok(ActivityPayload {
            titulo,
            tipo,
            curso,
            descripcion: self.descripcion.trim().to_string(),
            fecha_evento,
            fecha_limite,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn base() -> ActivityForm {
        ActivityForm {
            titulo: "Examen Final de Cálculo".into(),
            curso: "Matemáticas".into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_dates_become_none_and_type_defaults_to_other() {
        let payload = base().validate().unwrap();
        assert_eq!(payload.tipo, ActivityKind::Other);
        assert_eq!(payload.fecha_evento, None);
        assert_eq!(payload.fecha_limite, None);
    }

    #[test]
    fn title_checked_before_course() {
        let err = ActivityForm::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "El título es obligatorio.");

        let err = ActivityForm { titulo: "x".into(), ..Default::default() }.validate().unwrap_err();
        assert_eq!(err.to_string(), "El curso es obligatorio.");
    }

    #[test]
    fn rejects_bad_dates_and_types() {
        let mut form = base();
        form.fecha_limite = "31/02/2024".into();
        assert!(form.validate().is_err());

        let mut form = base();
        form.tipo = "seminar".into();
        assert!(form.validate().is_err());
    }

    #[test]
    fn prefill_round_trips_through_validation() {
        let mut form = base();
        form.tipo = "project".into();
        form.fecha_evento = "2024-06-01T09:30:00".into();
        form.fecha_limite = "2024-06-10".into();
        let payload = form.validate().unwrap();

        let activity = Activity {
            id: 1,
            title: payload.titulo.clone(),
            kind: payload.tipo,
            course: payload.curso.clone(),
            description: None,
            event_at: payload.fecha_evento,
            due_date: payload.fecha_limite,
            created_at: None,
            subtasks: Vec::new(),
        };
        assert_eq!(ActivityForm::from_activity(&activity), form);
    }

    #[test]
    fn prefilled_event_keeps_its_seconds() {
        let event = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 30, 45).unwrap();
        let activity = Activity {
            id: 4,
            title: "Laboratorio".into(),
            kind: ActivityKind::Workshop,
            course: "Química".into(),
            description: None,
            event_at: Some(event),
            due_date: None,
            created_at: None,
            subtasks: Vec::new(),
        };

        let mut form = ActivityForm::from_activity(&activity);
        assert_eq!(form.fecha_evento, "2024-06-01T09:30:45");

        form.titulo = "Laboratorio 2".into();
        assert_eq!(form.validate().unwrap().fecha_evento, Some(event));
    }
}
