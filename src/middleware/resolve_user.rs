use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::AuthUser;
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::UserService;

/// The resolved identity attached to every authenticated request
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Middleware that resolves the token subject to a persisted user record.
/// A subject with no matching user gets the same generic 401 as a bad token;
/// a persistence fault surfaces as a 500, never as an auth failure.
pub async fn resolve_user_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Set by jwt_auth_middleware, which always runs first
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| {
            ApiError::internal_server_error("Authentication required before user resolution")
        })?
        .clone();

    let service = UserService::new().await?;
    let user = service.resolve(auth_user.user_id).await?;

    tracing::debug!("Resolved user {} ({})", user.name, user.id);

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
