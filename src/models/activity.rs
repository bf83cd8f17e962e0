use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::subtask::Subtask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Exam,
    Quiz,
    Workshop,
    Project,
    Presentation,
    #[default]
    Other,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 6] = [
        ActivityKind::Exam,
        ActivityKind::Quiz,
        ActivityKind::Workshop,
        ActivityKind::Project,
        ActivityKind::Presentation,
        ActivityKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Exam => "exam",
            ActivityKind::Quiz => "quiz",
            ActivityKind::Workshop => "workshop",
            ActivityKind::Project => "project",
            ActivityKind::Presentation => "presentation",
            ActivityKind::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Exam => "Examen",
            ActivityKind::Quiz => "Quiz",
            ActivityKind::Workshop => "Taller",
            ActivityKind::Project => "Proyecto",
            ActivityKind::Presentation => "Presentación",
            ActivityKind::Other => "Otro",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| format!("unknown activity type: {}", s))
    }
}

/// Canonical activity record, whatever field names the server used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: i64,
    pub title: String,
    pub kind: ActivityKind,
    pub course: String,
    pub description: Option<String>,
    pub event_at: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub subtasks: Vec<Subtask>,
}

impl Activity {
    /// Payload that replaces this activity unchanged; edit screens start here.
    pub fn to_payload(&self) -> ActivityPayload {
        ActivityPayload {
            titulo: self.title.clone(),
            tipo: self.kind,
            curso: self.course.clone(),
            descripcion: self.description.clone().unwrap_or_default(),
            fecha_evento: self.event_at,
            fecha_limite: self.due_date,
        }
    }
}

/// Body of `POST /api/activities/` and `PUT /api/activities/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub titulo: String,
    pub tipo: ActivityKind,
    pub curso: String,
    pub descripcion: String,
    pub fecha_evento: Option<NaiveDateTime>,
    pub fecha_limite: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_wire_names() {
        assert_eq!("presentation".parse::<ActivityKind>(), Ok(ActivityKind::Presentation));
        assert!("seminar".parse::<ActivityKind>().is_err());
        assert_eq!(ActivityKind::default(), ActivityKind::Other);
    }

    #[test]
    fn payload_sends_null_for_missing_dates() {
        let payload = ActivityPayload {
            titulo: "Parcial".into(),
            tipo: ActivityKind::Exam,
            curso: "Cálculo".into(),
            descripcion: String::new(),
            fecha_evento: None,
            fecha_limite: NaiveDate::from_ymd_opt(2024, 5, 10),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["tipo"], "exam");
        assert!(json["fecha_evento"].is_null());
        assert_eq!(json["fecha_limite"], "2024-05-10");
    }
}
