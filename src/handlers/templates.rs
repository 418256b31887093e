// handlers/templates.rs - /api/templates and /api/templates/:id/config handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use super::json_body;
use crate::app::AppState;
use crate::database::models::Template;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::input::{optional_string, require_string};
use crate::validation::TemplateConfig;

/// GET /api/templates
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Template>> {
    Ok(ApiResponse::success(state.templates.list().await?))
}

/// POST /api/templates - Body: `{name, description?}`
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Template> {
    let body = json_body(body)?;
    let name = require_string(body.get("name"), "name")?;
    let description = optional_string(body.get("description"));

    let template = state.templates.create(&name, description).await?;
    Ok(ApiResponse::created(template))
}

/// PUT /api/templates/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(body)?;
    let name = require_string(body.get("name"), "name")?;
    let description = optional_string(body.get("description"));

    state.templates.update(&id, &name, description.as_deref()).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}

/// DELETE /api/templates/:id - Refused with 409 while cases still use the template
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    state.templates.delete(&id).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}

/// GET /api/templates/:id/config
pub async fn get_config(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<TemplateConfig> {
    Ok(ApiResponse::success(state.templates.get_config(&id).await?))
}

/// PUT /api/templates/:id/config - Body is the layout document itself:
/// `{version: 1, layout: [{fieldCode, span?, label?, placeholder?, visible?, readonly?}]}`
pub async fn put_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<TemplateConfig> {
    let body = json_body(body)?;
    let config = state.templates.replace_config(&id, &body).await?;
    Ok(ApiResponse::success(config))
}
