pub mod admin;
pub mod claims;
pub mod password;
pub mod state;

pub use admin::AdminPolicy;
pub use claims::{decode_token, issue_token, Claims, TokenValidation};
pub use password::{hash_password, verify_password};
pub use state::{AuthEvent, AuthState, StoredSession};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
