pub mod auth;
pub mod resolve_user;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use resolve_user::{resolve_user_middleware, CurrentUser};
pub use response::{ApiResponse, ApiResult};
