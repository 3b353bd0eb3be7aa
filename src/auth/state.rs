use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a client remembers about its signed-in session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Changes reported by the server that the client must mirror
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(StoredSession),
    TokenRefreshed {
        token: String,
        expires_at: Option<DateTime<Utc>>,
    },
    /// Result of a whoami call
    AdminResolved(bool),
    SignedOut,
}

/// Client-side auth state. Every transition goes through `apply`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(StoredSession),
}

impl AuthState {
    pub fn apply(self, event: AuthEvent) -> AuthState {
        match (self, event) {
            (_, AuthEvent::SignedIn(session)) => AuthState::SignedIn(session),
            // Sign-out drops everything, including the admin flag
            (_, AuthEvent::SignedOut) => AuthState::SignedOut,
            (AuthState::SignedIn(session), AuthEvent::TokenRefreshed { token, expires_at }) => {
                AuthState::SignedIn(StoredSession { token, expires_at, ..session })
            }
            (AuthState::SignedIn(session), AuthEvent::AdminResolved(is_admin)) => {
                AuthState::SignedIn(StoredSession { is_admin, ..session })
            }
            (AuthState::SignedOut, _) => AuthState::SignedOut,
        }
    }

    pub fn session(&self) -> Option<&StoredSession> {
        match self {
            AuthState::SignedIn(session) => Some(session),
            AuthState::SignedOut => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|s| s.token.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.session().map_or(false, |s| s.is_admin)
    }

    /// True when the token expires within `skew` of `now`
    pub fn needs_refresh(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        match self.session().and_then(|s| s.expires_at) {
            Some(expires_at) => expires_at - skew <= now,
            None => false,
        }
    }
}
