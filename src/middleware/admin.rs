use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::AuthUser;
use crate::auth::AdminPolicy;
use crate::error::ApiError;
use crate::services::AccountService;

/// Allowlisted email, or the `admin` role on the caller's profile
pub async fn is_admin(user: &AuthUser) -> Result<bool, ApiError> {
    let policy = AdminPolicy::from_config();
    if policy.is_allowlisted(&user.email) {
        return Ok(true);
    }
    let profile = AccountService::new()?.profile(user.user_id).await?;
    Ok(policy.is_admin(&user.email, profile.as_ref().map(|p| p.role.as_str())))
}

/// Runs after `jwt_auth_middleware`; rejects callers who are not admins
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !is_admin(&user).await? {
        tracing::warn!("Admin access denied for {}", user.user_id);
        return Err(ApiError::forbidden("Administrator access required"));
    }
    Ok(next.run(request).await)
}
