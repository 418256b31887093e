// handlers/mod.rs - HTTP handlers, one module per resource
//
// Handlers only parse input and shape output; rules live in crate::services.
pub mod cases;
pub mod fields;
pub mod health;
pub mod roles;
pub mod templates;

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::Value;

use crate::error::ApiError;

/// Unwrap a JSON body, turning extractor rejections into `INVALID_JSON`.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    let Json(value) = body?;
    Ok(value)
}
