use serde::Deserialize;
use serde_json::Value;

/// `{"error": "..."}` as returned by the register endpoint.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Pulls a human message out of an error response body.
///
/// Either a single `error` string, or the field errors of a validation
/// response (`{"titulo": ["Este campo es obligatorio."], ...}`) joined by
/// spaces.
pub fn server_message(body: &str) -> Option<String> {
    if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(body) {
        return Some(error);
    }

    let value: Value = serde_json::from_str(body).ok()?;
    let mut parts = Vec::new();
    collect_strings(&value, &mut parts);
    let joined = parts.join(" ");
    if joined.trim().is_empty() { None } else { Some(joined) }
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}
