use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskStatus {
    #[default]
    Pending,
    Done,
    Postponed,
}

impl SubtaskStatus {
    pub const ALL: [SubtaskStatus; 3] = [
        SubtaskStatus::Pending,
        SubtaskStatus::Done,
        SubtaskStatus::Postponed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubtaskStatus::Pending => "pending",
            SubtaskStatus::Done => "done",
            SubtaskStatus::Postponed => "postponed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubtaskStatus::Pending => "Pendiente",
            SubtaskStatus::Done => "Hecho",
            SubtaskStatus::Postponed => "Pospuesto",
        }
    }

    /// done <-> pending; a postponed subtask toggles to done.
    pub fn toggled(&self) -> SubtaskStatus {
        match self {
            SubtaskStatus::Done => SubtaskStatus::Pending,
            SubtaskStatus::Pending | SubtaskStatus::Postponed => SubtaskStatus::Done,
        }
    }
}

impl fmt::Display for SubtaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubtaskStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| format!("unknown subtask status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum SubtaskId {
    Remote(i64),
    /// Local placeholder, never sent to the server.
    Draft(Uuid),
}

impl SubtaskId {
    pub fn new_draft() -> Self {
        SubtaskId::Draft(Uuid::new_v4())
    }

    pub fn remote(&self) -> Option<i64> {
        match self {
            SubtaskId::Remote(id) => Some(*id),
            SubtaskId::Draft(_) => None,
        }
    }
}

impl fmt::Display for SubtaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtaskId::Remote(id) => write!(f, "{}", id),
            SubtaskId::Draft(uuid) => write!(f, "draft-{}", &uuid.simple().to_string()[..8]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subtask {
    pub id: SubtaskId,
    /// `None` only while the owning activity has not been created yet.
    pub activity_id: Option<i64>,
    pub name: String,
    pub status: SubtaskStatus,
    pub target_date: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
}

impl Subtask {
    pub fn is_completed(&self) -> bool {
        self.status == SubtaskStatus::Done
    }

    /// The creation body for a drafted subtask; `None` when it lacks the
    /// required date or hours.
    pub fn as_new_subtask(&self) -> Option<NewSubtask> {
        Some(NewSubtask {
            nombre: self.name.clone(),
            fecha_objetivo: self.target_date?,
            horas_estimadas: self.estimated_hours?,
            estado: self.status,
        })
    }

    pub fn from_new(id: SubtaskId, activity_id: Option<i64>, new: &NewSubtask) -> Self {
        Self {
            id,
            activity_id,
            name: new.nombre.clone(),
            status: new.estado,
            target_date: Some(new.fecha_objetivo),
            estimated_hours: Some(new.horas_estimadas),
        }
    }
}

/// Body of `POST /api/activities/{id}/subtasks/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubtask {
    pub nombre: String,
    pub fecha_objetivo: NaiveDate,
    pub horas_estimadas: f64,
    #[serde(default)]
    pub estado: SubtaskStatus,
}

/// Body of `PATCH /api/activities/{id}/subtasks/{sub_id}/`; only set fields go out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubtaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<SubtaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_objetivo: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horas_estimadas: Option<f64>,
}

impl SubtaskPatch {
    pub fn status(status: SubtaskStatus) -> Self {
        Self {
            estado: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub percent: u8,
    pub hours: f64,
}

impl Progress {
    pub fn of(subtasks: &[Subtask]) -> Self {
        let total = subtasks.len();
        let done = subtasks.iter().filter(|s| s.is_completed()).count();
        let hours = subtasks.iter().filter_map(|s| s.estimated_hours).sum();
        Self {
            done,
            total,
            percent: progress_percent(done, total),
            hours,
        }
    }
}

/// round(100 * done / total), halves rounded up; 0 for an empty list.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    ((200 * done + total) / (2 * total)) as u8
}
