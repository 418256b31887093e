pub mod auth;
pub mod request_id;
pub mod response;

pub use auth::{role_gate_middleware, RoleCode};
pub use request_id::{request_id_middleware, RequestId};
pub use response::{ApiResponse, ApiResult};
