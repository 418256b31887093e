// handlers/fields.rs - /api/templates/:id/fields handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use super::json_body;
use crate::app::AppState;
use crate::database::models::{TemplateField, TemplateFieldInput};
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::input::{flag, optional_number, optional_string, require_object, require_string};
use crate::validation::{FieldDefinition, FieldType, ValidationError};

/// GET /api/templates/:id/fields
pub async fn list(State(state): State<AppState>, Path(template_id): Path<String>) -> ApiResult<Vec<TemplateField>> {
    Ok(ApiResponse::success(state.templates.list_fields(&template_id).await?))
}

/// POST /api/templates/:id/fields
pub async fn create(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<TemplateField> {
    let input = field_input(&json_body(body)?)?;
    let field = state.templates.create_field(&template_id, &input).await?;
    Ok(ApiResponse::created(field))
}

/// PUT /api/templates/:id/fields/:field_id - Full replacement of the field definition
pub async fn update(
    State(state): State<AppState>,
    Path((template_id, field_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<TemplateField> {
    let input = field_input(&json_body(body)?)?;
    let field = state.templates.update_field(&template_id, &field_id, &input).await?;
    Ok(ApiResponse::success(field))
}

/// DELETE /api/templates/:id/fields/:field_id
pub async fn delete(
    State(state): State<AppState>,
    Path((template_id, field_id)): Path<(String, String)>,
) -> ApiResult<Value> {
    state.templates.delete_field(&template_id, &field_id).await?;
    Ok(ApiResponse::success(json!({ "id": field_id })))
}

fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

/// Shape-check a field body. Definition rules (known type, compilable
/// regex, bounds order) are enforced by the template service.
fn field_input(body: &Value) -> Result<TemplateFieldInput, ValidationError> {
    let body = require_object(body, "body")?;

    let definition = FieldDefinition {
        field_code: require_string(body.get("fieldCode"), "fieldCode")?,
        field_name: require_string(body.get("fieldName"), "fieldName")?,
        field_type: FieldType::from(require_string(body.get("fieldType"), "fieldType")?),
        required: flag(body.get("required")),
        options: present(body.get("options")),
        regex: optional_string(body.get("regex")),
        min: optional_number(body.get("min"), "min")?,
        max: optional_number(body.get("max"), "max")?,
    };

    Ok(TemplateFieldInput {
        definition,
        default_value: present(body.get("defaultValue")),
        placeholder: optional_string(body.get("placeholder")),
        help_text: optional_string(body.get("helpText")),
        status: optional_string(body.get("status")).unwrap_or_else(|| "active".to_string()),
    })
}
