// handlers/cases.rs - /api/cases handlers

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Map, Value};

use super::json_body;
use crate::app::AppState;
use crate::database::models::{CaseDetail, CaseFilters, CaseRecord};
use crate::middleware::{ApiResponse, ApiResult, RoleCode};
use crate::services::case_service::CaseUpdate;
use crate::validation::input::{optional_string, require_object, require_string};

/// GET /api/cases?templateId=&keyword=&from=&to=&includeDeleted=1
pub async fn list(State(state): State<AppState>, Query(filters): Query<CaseFilters>) -> ApiResult<Vec<CaseRecord>> {
    let cases = state.cases.list(&filters.normalized()).await?;
    Ok(ApiResponse::success(cases))
}

/// POST /api/cases - Body: `{templateId, title, values?}`
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<CaseRecord> {
    let body = json_body(body)?;
    let template_id = require_string(body.get("templateId"), "templateId")?;
    let title = require_string(body.get("title"), "title")?;
    let values = match body.get("values") {
        None | Some(Value::Null) => Map::new(),
        Some(v) => require_object(v, "values")?.clone(),
    };

    let case = state.cases.create(&template_id, &title, values).await?;
    Ok(ApiResponse::created(case))
}

/// GET /api/cases/:id - Case with template, layout, fields and data
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CaseDetail> {
    Ok(ApiResponse::success(state.cases.detail(&id).await?))
}

/// PUT /api/cases/:id - Body: `{title, status?, data_json}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<CaseDetail> {
    let body = json_body(body)?;
    let update = CaseUpdate {
        title: require_string(body.get("title"), "title")?,
        status: optional_string(body.get("status")),
        // Shape is checked by the case data validator
        data: match body.get("data_json") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(v) => v.clone(),
        },
    };

    let detail = state.cases.update(&id, &update).await?;
    Ok(ApiResponse::success(detail))
}

/// DELETE /api/cases/:id - Soft delete, admin only
pub async fn delete(
    State(state): State<AppState>,
    Extension(role): Extension<RoleCode>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    state.cases.delete(&id, role.as_str()).await?;
    Ok(ApiResponse::success(json!({ "id": id })))
}
