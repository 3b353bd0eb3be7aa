// handlers/public/auth.rs - POST /auth/register, /auth/login, /auth/refresh
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::{decode_token, hash_password, issue_token, verify_password, Claims, TokenValidation};
use crate::config;
use crate::database::models::{AuthSession, Profile, User};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::account_service::normalize_email;
use crate::services::AccountService;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub session_id: uuid::Uuid,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

fn sign_for(user: User, profile: Option<Profile>, session: &AuthSession, now: DateTime<Utc>) -> Result<TokenResponse, ApiError> {
    let security = &config::config().security;
    let claims = Claims::new(user.id, user.email.clone(), session.id, now, security);
    let token = issue_token(&claims, security)?;
    Ok(TokenResponse {
        token,
        expires_at: claims.expires_at(),
        session_id: session.id,
        user,
        profile,
    })
}

fn validate_registration(request: &RegisterRequest) -> Result<String, ApiError> {
    let mut field_errors = HashMap::new();

    let email = match normalize_email(&request.email) {
        Ok(email) => Some(email),
        Err(e) => {
            field_errors.insert("email".to_string(), e.to_string());
            None
        }
    };
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        field_errors.insert(
            "password".to_string(),
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    }

    match email {
        Some(email) if field_errors.is_empty() => Ok(email),
        _ => Err(ApiError::validation_error("Invalid registration", Some(field_errors))),
    }
}

/// POST /auth/register - create an account and sign it in
pub async fn register(ApiJson(request): ApiJson<RegisterRequest>) -> ApiResult<TokenResponse> {
    let email = validate_registration(&request)?;
    let password_hash = hash_password(&request.password)?;

    let accounts = AccountService::new()?;
    let (user, profile) = accounts.register(&email, &password_hash, &request.full_name).await?;

    let now = Utc::now();
    let session = accounts
        .open_session(user.id, now, config::config().security.refresh_window_days)
        .await?;
    Ok(ApiResponse::created(sign_for(user, Some(profile), &session, now)?))
}

/// POST /auth/login - exchange credentials for a token
pub async fn login(ApiJson(request): ApiJson<LoginRequest>) -> ApiResult<TokenResponse> {
    let accounts = AccountService::new()?;

    // Same answer for unknown email and wrong password
    let user = match accounts.find_by_email(&request.email).await? {
        Some(user) if verify_password(&request.password, &user.password_hash) => user,
        _ => {
            tracing::info!("Failed login attempt");
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
    };

    let now = Utc::now();
    let session = accounts
        .open_session(user.id, now, config::config().security.refresh_window_days)
        .await?;
    let profile = accounts.profile(user.id).await?;
    tracing::info!("User {} signed in (session {})", user.id, session.id);
    Ok(ApiResponse::success(sign_for(user, profile, &session, now)?))
}

/// POST /auth/refresh - reissue a possibly expired token for a live session
pub async fn refresh(ApiJson(request): ApiJson<RefreshRequest>) -> ApiResult<TokenResponse> {
    let claims = decode_token(&request.token, TokenValidation::AllowExpired, &config::config().security)?;

    let accounts = AccountService::new()?;
    let now = Utc::now();
    let session = accounts
        .touch_session(claims.sid, now)
        .await?
        .filter(|s| s.user_id == claims.sub)
        .ok_or_else(|| ApiError::unauthorized("Session can no longer be refreshed"))?;

    let user = accounts
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;
    let profile = accounts.profile(user.id).await?;
    Ok(ApiResponse::success(sign_for(user, profile, &session, now)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: "Ada".to_string(),
        }
    }

    #[test]
    fn registration_normalizes_email() {
        assert_eq!(validate_registration(&request(" Ada@Uni.edu", "longenough")).unwrap(), "ada@uni.edu");
    }

    #[test]
    fn registration_reports_every_bad_field() {
        match validate_registration(&request("nope", "short")) {
            Err(ApiError::ValidationError { field_errors: Some(fields), .. }) => {
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
