//! Decoders from raw server records into the canonical models.
//!
//! The server has shipped the same entity under Spanish and English field
//! names. Each canonical field lists its candidates in preference order and
//! the first non-null one wins. A field that is absent everywhere falls
//! back to an empty value; a field that is present with the wrong shape is
//! an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::{Activity, ActivityKind, Subtask, SubtaskId, SubtaskStatus};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("expected a list of records")]
    NotAList,

    #[error("missing field: {0}")]
    Missing(&'static str),

    #[error("field {field} has the wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field {field} has an unknown value: {value}")]
    UnknownValue { field: &'static str, value: String },

    #[error("field {field} is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("malformed JSON: {0}")]
    Json(String),
}

const ACTIVITY_TITLE: &[&str] = &["titulo", "title"];
const ACTIVITY_KIND: &[&str] = &["tipo", "type"];
const ACTIVITY_COURSE: &[&str] = &["curso", "course"];
const ACTIVITY_DESCRIPTION: &[&str] = &["descripcion", "description"];
const ACTIVITY_EVENT: &[&str] = &["fecha_evento", "fechaEvento", "event_date"];
const ACTIVITY_DUE: &[&str] = &["fecha_limite", "fechaLimite", "due_date"];
const ACTIVITY_CREATED: &[&str] = &["fecha_creacion", "created_at", "createdAt"];
const ACTIVITY_SUBTASKS: &[&str] = &["subtareas", "subtasks", "subactivities"];

const SUBTASK_NAME: &[&str] = &["nombre", "name"];
const SUBTASK_STATUS: &[&str] = &["estado", "status"];
const SUBTASK_COMPLETED: &[&str] = &["completada", "completed"];
const SUBTASK_TARGET: &[&str] = &["fecha_objetivo", "targetDate", "target_date"];
const SUBTASK_HOURS: &[&str] = &["horas_estimadas", "estimatedHours", "hours"];
const SUBTASK_ACTIVITY: &[&str] = &["actividad", "activity", "activity_id"];

pub fn decode_activity(value: &Value) -> Result<Activity, DecodeError> {
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let id = required_id(obj)?;

    let kind = match text(obj, ACTIVITY_KIND)? {
        Some(raw) => raw.parse::<ActivityKind>().map_err(|_| DecodeError::UnknownValue {
            field: "tipo",
            value: raw,
        })?,
        None => ActivityKind::default(),
    };

    let subtasks = match first_present(obj, ACTIVITY_SUBTASKS) {
        Some(Value::Array(items)) => subtask_items(items, Some(id)),
        Some(_) => {
            return Err(DecodeError::WrongType {
                field: "subtareas",
                expected: "list",
            });
        }
        None => Vec::new(),
    };

    Ok(Activity {
        id,
        title: text(obj, ACTIVITY_TITLE)?.unwrap_or_default(),
        kind,
        course: text(obj, ACTIVITY_COURSE)?.unwrap_or_default(),
        description: text(obj, ACTIVITY_DESCRIPTION)?.filter(|d| !d.is_empty()),
        event_at: date_time(obj, ACTIVITY_EVENT, "fecha_evento")?,
        due_date: date(obj, ACTIVITY_DUE, "fecha_limite")?,
        created_at: timestamp(obj, ACTIVITY_CREATED, "fecha_creacion")?,
        subtasks,
    })
}

/// `parent` is the id of the activity the record was fetched under.
pub fn decode_subtask(value: &Value, parent: Option<i64>) -> Result<Subtask, DecodeError> {
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let id = required_id(obj)?;

    let status = match text(obj, SUBTASK_STATUS)? {
        Some(raw) => raw.parse::<SubtaskStatus>().map_err(|_| DecodeError::UnknownValue {
            field: "estado",
            value: raw,
        })?,
        None => match first_present(obj, SUBTASK_COMPLETED) {
            Some(Value::Bool(true)) => SubtaskStatus::Done,
            Some(Value::Bool(false)) | None => SubtaskStatus::Pending,
            Some(_) => {
                return Err(DecodeError::WrongType {
                    field: "completada",
                    expected: "boolean",
                });
            }
        },
    };

    let activity_id = match first_present(obj, SUBTASK_ACTIVITY) {
        Some(v) => Some(v.as_i64().ok_or(DecodeError::WrongType {
            field: "actividad",
            expected: "integer",
        })?),
        None => parent,
    };

    Ok(Subtask {
        id: SubtaskId::Remote(id),
        activity_id,
        name: text(obj, SUBTASK_NAME)?.unwrap_or_default(),
        status,
        target_date: date(obj, SUBTASK_TARGET, "fecha_objetivo")?,
        estimated_hours: hours(obj)?,
    })
}

/// Decodes a list response, skipping records that fail to decode.
pub fn decode_activities(value: &Value) -> Result<Vec<Activity>, DecodeError> {
    let items = list_items(value)?;
    Ok(items
        .iter()
        .filter_map(|item| match decode_activity(item) {
            Ok(activity) => Some(activity),
            Err(e) => {
                warn!("Failed to decode activity {}: {}", record_id(item), e);
                None
            }
        })
        .collect())
}

pub fn decode_subtasks(value: &Value, parent: Option<i64>) -> Result<Vec<Subtask>, DecodeError> {
    Ok(subtask_items(list_items(value)?, parent))
}

fn subtask_items(items: &[Value], parent: Option<i64>) -> Vec<Subtask> {
    items
        .iter()
        .filter_map(|item| match decode_subtask(item, parent) {
            Ok(subtask) => Some(subtask),
            Err(e) => {
                warn!("Failed to decode subtask {}: {}", record_id(item), e);
                None
            }
        })
        .collect()
}

/// Accepts a bare array or a paginated `{"results": [...]}` envelope.
fn list_items(value: &Value) -> Result<&Vec<Value>, DecodeError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => match obj.get("results") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(DecodeError::NotAList),
        },
        _ => Err(DecodeError::NotAList),
    }
}

fn record_id(value: &Value) -> String {
    value
        .get("id")
        .map(|id| id.to_string())
        .unwrap_or_else(|| "<no id>".to_string())
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn required_id(obj: &Map<String, Value>) -> Result<i64, DecodeError> {
    match obj.get("id") {
        None | Some(Value::Null) => Err(DecodeError::Missing("id")),
        Some(v) => v.as_i64().ok_or(DecodeError::WrongType {
            field: "id",
            expected: "integer",
        }),
    }
}

fn text(obj: &Map<String, Value>, keys: &'static [&'static str]) -> Result<Option<String>, DecodeError> {
    match first_present(obj, keys) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DecodeError::WrongType {
            field: keys[0],
            expected: "string",
        }),
    }
}

fn date(
    obj: &Map<String, Value>,
    keys: &'static [&'static str],
    field: &'static str,
) -> Result<Option<NaiveDate>, DecodeError> {
    let Some(raw) = date_text(obj, keys, field)? else {
        return Ok(None);
    };
    parse_date(&raw)
        .map(Some)
        .ok_or(DecodeError::InvalidDate { field, value: raw })
}

fn date_time(
    obj: &Map<String, Value>,
    keys: &'static [&'static str],
    field: &'static str,
) -> Result<Option<NaiveDateTime>, DecodeError> {
    let Some(raw) = date_text(obj, keys, field)? else {
        return Ok(None);
    };
    parse_date_time(&raw)
        .map(Some)
        .ok_or(DecodeError::InvalidDate { field, value: raw })
}

fn timestamp(
    obj: &Map<String, Value>,
    keys: &'static [&'static str],
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let Some(raw) = date_text(obj, keys, field)? else {
        return Ok(None);
    };
    parse_timestamp(&raw)
        .map(Some)
        .ok_or(DecodeError::InvalidDate { field, value: raw })
}

/// Empty strings count as "no date"; forms post them that way.
fn date_text(
    obj: &Map<String, Value>,
    keys: &'static [&'static str],
    field: &'static str,
) -> Result<Option<String>, DecodeError> {
    match first_present(obj, keys) {
        None => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "date string",
        }),
    }
}

/// Django serializes decimals as strings, so both shapes are accepted.
fn hours(obj: &Map<String, Value>) -> Result<Option<f64>, DecodeError> {
    let wrong = DecodeError::WrongType {
        field: "horas_estimadas",
        expected: "number",
    };
    match first_present(obj, SUBTASK_HOURS) {
        None => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(wrong),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| wrong),
        Some(_) => Err(wrong),
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_date_time(raw).map(|dt| dt.date()))
}

/// Wall-clock time as the user entered it; an offset, if any, is kept as written.
pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_date_time(raw).map(|dt| dt.and_utc())
}
