pub mod admin;
pub mod auth;
pub mod json;
pub mod response;

pub use admin::{is_admin, require_admin};
pub use auth::{jwt_auth_middleware, AuthUser};
pub use json::ApiJson;
pub use response::{ApiResponse, ApiResult};
