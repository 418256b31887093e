use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::{migrate, DatabaseManager};
use crate::error::ApiError;
use crate::handlers::{cases, fields, health, roles, templates};
use crate::middleware::{request_id_middleware, role_gate_middleware};
use crate::services::{CaseService, RoleService, TemplateService};

/// Shared handler state; every member is a cheap clone over the same pool.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseManager,
    pub roles: RoleService,
    pub templates: TemplateService,
    pub cases: CaseService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseManager) -> Self {
        Self {
            config: Arc::new(config),
            roles: RoleService::new(db.clone()),
            templates: TemplateService::new(db.clone()),
            cases: CaseService::new(db.clone()),
            db,
        }
    }

    /// Open and migrate the configured database. Default roles are seeded
    /// only when the file is created by this call.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let (db, created) = DatabaseManager::open(&config.database)
            .await
            .with_context(|| format!("opening database {}", config.database.path.display()))?;
        migrate::migrate(&db, created).await.context("migrating database")?;
        Ok(Self::new(config, db))
    }
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("not found")
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::get))
        .route("/api/roles", get(roles::list).post(roles::create))
        .route("/api/roles/:id", put(roles::update).delete(roles::delete))
        .route("/api/templates", get(templates::list).post(templates::create))
        .route("/api/templates/:id", put(templates::update).delete(templates::delete))
        .route("/api/templates/:id/fields", get(fields::list).post(fields::create))
        .route(
            "/api/templates/:id/fields/:field_id",
            put(fields::update).delete(fields::delete),
        )
        .route(
            "/api/templates/:id/config",
            get(templates::get_config).put(templates::put_config),
        )
        .route("/api/cases", get(cases::list).post(cases::create))
        .route(
            "/api/cases/:id",
            get(cases::get).put(cases::update).delete(cases::delete),
        )
        .route("/api", any(api_not_found))
        .route("/api/*rest", any(api_not_found))
}

/// Full application: API routes, static UI fallback and the middleware stack.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();
    let mut app = api_routes().with_state(state);

    match config.server.static_dir.as_ref().filter(|dir| dir.is_dir()) {
        Some(dir) => {
            info!("Serving static UI from {}", dir.display());
            let index = ServeFile::new(dir.join("index.html"));
            app = app.fallback_service(ServeDir::new(dir).fallback(index));
        }
        None => {
            if let Some(dir) = &config.server.static_dir {
                warn!("Static dir {} not found; UI disabled", dir.display());
            }
            app = app.fallback(api_not_found);
        }
    }

    app.layer(
        ServiceBuilder::new()
            .layer(CorsLayer::permissive())
            .layer(from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(config.api.max_body_bytes))
            .layer(from_fn_with_state(config.auth.mode, role_gate_middleware)),
    )
}
