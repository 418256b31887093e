// handlers/health.rs - GET /api/health handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::now_iso;

/// GET /api/health - Liveness plus a database ping
pub async fn get(State(state): State<AppState>) -> ApiResult<Value> {
    if let Err(e) = state.db.health_check().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("database unavailable"));
    }
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": now_iso(),
        "database": "ok"
    })))
}
