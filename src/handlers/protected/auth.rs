use axum::Extension;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Profile, User};
use crate::error::ApiError;
use crate::middleware::{is_admin, ApiResponse, ApiResult, AuthUser};
use crate::services::AccountService;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user: User,
    pub profile: Option<Profile>,
    pub is_admin: bool,
    pub session_id: Uuid,
}

/// GET /api/auth/whoami
pub async fn whoami(Extension(auth_user): Extension<AuthUser>) -> ApiResult<WhoAmI> {
    let accounts = AccountService::new()?;
    let user = accounts
        .find_user(auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;
    let profile = accounts.profile(user.id).await?;

    Ok(ApiResponse::success(WhoAmI {
        is_admin: is_admin(&auth_user).await?,
        session_id: auth_user.session_id,
        user,
        profile,
    }))
}

#[derive(Debug, Serialize)]
pub struct SignedOut {
    pub signed_out: bool,
}

/// DELETE /api/auth/session - revoke the caller's session
pub async fn logout(Extension(auth_user): Extension<AuthUser>) -> ApiResult<SignedOut> {
    let revoked = AccountService::new()?
        .revoke_session(auth_user.session_id, Utc::now())
        .await?;
    tracing::info!("User {} signed out (session {})", auth_user.user_id, auth_user.session_id);
    Ok(ApiResponse::success(SignedOut { signed_out: revoked }))
}
