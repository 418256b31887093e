// handlers/roles.rs - /api/roles handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use super::json_body;
use crate::app::AppState;
use crate::database::models::Role;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::input::{optional_string, require_string};

/// GET /api/roles
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    Ok(ApiResponse::success(state.roles.list().await?))
}

/// POST /api/roles - Body: `{name, description?}`
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Role> {
    let body = json_body(body)?;
    let name = require_string(body.get("name"), "name")?;
    let description = optional_string(body.get("description"));

    let role = state.roles.create(&name, description).await?;
    Ok(ApiResponse::created(role))
}

/// PUT /api/roles/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(body)?;
    let name = require_string(body.get("name"), "name")?;
    let description = optional_string(body.get("description"));

    state.roles.update(&id, &name, description.as_deref()).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}

/// DELETE /api/roles/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    state.roles.delete(&id).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}
