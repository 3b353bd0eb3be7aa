use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{AuthSession, Profile, User};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("An account with email '{0}' already exists")]
    EmailTaken(String),
    #[error("Invalid account details: {0}")]
    Invalid(String),
}

/// Accounts, profiles and the server-side sessions behind issued tokens
pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new() -> Result<Self, AccountError> {
        Ok(Self::with_pool(DatabaseManager::pool()?.clone()))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the credentials row and its profile in one transaction
    pub async fn register(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<(User, Profile), AccountError> {
        let email = normalize_email(email)?;
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(&email)
        .bind(password_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AccountError::EmailTaken(email.clone()))?;

        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (id, full_name) VALUES ($1, $2) RETURNING *",
        )
        .bind(user.id)
        .bind(full_name.trim())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Registered account {}", user.id);
        Ok((user, profile))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let email = email.trim().to_ascii_lowercase();
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AccountError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, AccountError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn set_avatar_url(&self, user_id: Uuid, url: &str) -> Result<Option<Profile>, AccountError> {
        let profile = sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET avatar_url = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Start a session that may be refreshed for `refresh_window_days`
    pub async fn open_session(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        refresh_window_days: u64,
    ) -> Result<AuthSession, AccountError> {
        let refresh_until = now + Duration::days(refresh_window_days as i64);
        let session = sqlx::query_as::<_, AuthSession>(
            "INSERT INTO auth_sessions (user_id, created_at, refreshed_at, refresh_until) \
             VALUES ($1, $2, $2, $3) RETURNING *",
        )
        .bind(user_id)
        .bind(now)
        .bind(refresh_until)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn session(&self, session_id: Uuid) -> Result<Option<AuthSession>, AccountError> {
        let session = sqlx::query_as::<_, AuthSession>("SELECT * FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    /// Record a refresh. Only active sessions inside their window qualify.
    pub async fn touch_session(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<Option<AuthSession>, AccountError> {
        let session = sqlx::query_as::<_, AuthSession>(
            "UPDATE auth_sessions SET refreshed_at = $2 \
             WHERE id = $1 AND revoked_at IS NULL AND refresh_until > $2 RETURNING *",
        )
        .bind(session_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn revoke_session(&self, session_id: Uuid, now: DateTime<Utc>) -> Result<bool, AccountError> {
        let result = sqlx::query(
            "UPDATE auth_sessions SET revoked_at = $2 WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(session_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Lowercase and minimally validate an email address
pub fn normalize_email(email: &str) -> Result<String, AccountError> {
    let email = email.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace) => {
            Ok(email)
        }
        _ => Err(AccountError::Invalid("Email must look like name@domain".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email_case_and_whitespace() {
        assert_eq!(normalize_email("  Ada@Uni.EDU ").unwrap(), "ada@uni.edu");
    }

    #[test]
    fn rejects_emails_without_both_halves() {
        assert!(normalize_email("ada").is_err());
        assert!(normalize_email("@uni.edu").is_err());
        assert!(normalize_email("ada@").is_err());
        assert!(normalize_email("a da@uni.edu").is_err());
    }
}
