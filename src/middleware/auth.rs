use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::config::AuthMode;
use crate::error::ApiError;

pub const ROLE_HEADER: &str = "x-role-code";
pub const ADMIN_ROLE: &str = "admin";

/// Role code of the caller, inserted into request extensions by the role gate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleCode(pub String);

impl RoleCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
}

/// Permissions granted to a role code. Unknown roles get none.
pub fn permissions(role_code: &str) -> &'static [Permission] {
    match role_code {
        "admin" | "editor" => &[Permission::Read, Permission::Write],
        "viewer" => &[Permission::Read],
        _ => &[],
    }
}

pub fn required_permission(method: &Method) -> Permission {
    if method == Method::GET || method == Method::HEAD {
        Permission::Read
    } else {
        Permission::Write
    }
}

pub fn can_access(role_code: &str, method: &Method) -> bool {
    permissions(role_code).contains(&required_permission(method))
}

fn is_gated(path: &str) -> bool {
    path != "/api/health" && (path == "/api" || path.starts_with("/api/"))
}

/// Header-based role gate for `/api/*`.
///
/// With `AuthMode::Disabled` every request runs as admin.
pub async fn role_gate_middleware(
    State(mode): State<AuthMode>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if mode == AuthMode::Disabled {
        request.extensions_mut().insert(RoleCode(ADMIN_ROLE.to_string()));
        return Ok(next.run(request).await);
    }
    if !is_gated(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let role_code = request
        .headers()
        .get(ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::unauthorized("x-role-code required"))?;

    if !can_access(&role_code, request.method()) {
        tracing::warn!(
            "Role {} denied {} {}",
            role_code,
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::forbidden("forbidden"));
    }

    request.extensions_mut().insert(RoleCode(role_code));
    Ok(next.run(request).await)
}
