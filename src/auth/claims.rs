use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::config::SecurityConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub email: String,
    /// Server-side session id (auth_sessions.id)
    pub sid: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn new(user_id: Uuid, email: impl Into<String>, session_id: Uuid, now: DateTime<Utc>, security: &SecurityConfig) -> Self {
        let exp = now + Duration::hours(security.jwt_expiry_hours as i64);
        Self {
            sub: user_id,
            email: email.into(),
            sid: session_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: security.jwt_issuer.clone(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidation {
    Strict,
    /// Signature and issuer are still checked; used by the refresh flow
    AllowExpired,
}

pub fn issue_token(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    let key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn decode_token(token: &str, mode: TokenValidation, security: &SecurityConfig) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[security.jwt_issuer.as_str()]);
    validation.leeway = 0;
    if mode == TokenValidation::AllowExpired {
        validation.validate_exp = false;
    }

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "campus-portal".to_string(),
            jwt_expiry_hours: 1,
            refresh_window_days: 30,
            admin_emails: vec![],
            cors_origins: vec![],
        }
    }

    fn claims_at(now: DateTime<Utc>) -> Claims {
        Claims::new(Uuid::new_v4(), "ada@uni.edu", Uuid::new_v4(), now, &security())
    }

    #[test]
    fn round_trips_claims() {
        let claims = claims_at(Utc::now());
        let token = issue_token(&claims, &security()).unwrap();
        let decoded = decode_token(&token, TokenValidation::Strict, &security()).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn expired_tokens_only_pass_when_allowed() {
        let claims = claims_at(Utc::now() - Duration::hours(3));
        let token = issue_token(&claims, &security()).unwrap();

        assert!(matches!(
            decode_token(&token, TokenValidation::Strict, &security()),
            Err(AuthError::Expired)
        ));
        assert!(decode_token(&token, TokenValidation::AllowExpired, &security()).is_ok());
    }

    #[test]
    fn rejects_wrong_secret_and_issuer() {
        let token = issue_token(&claims_at(Utc::now()), &security()).unwrap();

        let mut other = security();
        other.jwt_secret = "different".to_string();
        assert!(matches!(
            decode_token(&token, TokenValidation::AllowExpired, &other),
            Err(AuthError::InvalidToken(_))
        ));

        let mut other = security();
        other.jwt_issuer = "someone-else".to_string();
        assert!(decode_token(&token, TokenValidation::Strict, &other).is_err());
    }

    #[test]
    fn refuses_to_sign_without_secret() {
        let mut empty = security();
        empty.jwt_secret.clear();
        assert!(matches!(issue_token(&claims_at(Utc::now()), &empty), Err(AuthError::MissingSecret)));
    }
}
