// Request body helpers shared by the handlers
use serde_json::{Map, Value};

use super::ValidationError;

pub fn require_string(value: Option<&Value>, name: &str) -> Result<String, ValidationError> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ValidationError::new(format!("{} required", name))),
    }
}

/// Missing, null and "" become `None`; other scalars are stringified.
pub fn optional_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn require_object<'a>(value: &'a Value, name: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::new(format!("{} must be object", name)))
}

pub fn require_array<'a>(value: &'a Value, name: &str) -> Result<&'a Vec<Value>, ValidationError> {
    value
        .as_array()
        .ok_or_else(|| ValidationError::new(format!("{} must be array", name)))
}

/// Optional number accepting numeric strings; anything else is an error.
pub fn optional_number(value: Option<&Value>, name: &str) -> Result<Option<f64>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(other) => super::case_data::parse_number(other)
            .map(Some)
            .ok_or_else(|| ValidationError::new(format!("{} must be number", name))),
    }
}

pub fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}
