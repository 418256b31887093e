pub mod case_service;
pub mod role_service;
pub mod template_service;

pub use case_service::CaseService;
pub use role_service::RoleService;
pub use template_service::TemplateService;

use thiserror::Error;

use crate::database::DatabaseError;
use crate::validation::ValidationError;

/// Business rule failures, mapped onto HTTP statuses by `ApiError`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn not_found() -> Self {
        ServiceError::NotFound("not found".to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(ValidationError::new(message))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Turn a unique-constraint failure into a 409 naming the clashing value.
pub(crate) fn conflict_on_unique(err: DatabaseError, value: &str) -> ServiceError {
    if err.is_unique_violation() {
        ServiceError::Conflict(format!("{} already exists", value))
    } else {
        ServiceError::Database(err)
    }
}
