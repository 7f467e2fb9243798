//! Access tokens and password hashing
//!
//! Two token formats sit behind the [`Maker`] trait: HS256 JWTs
//! ([`JwtMaker`]) and PASETO v4.local ([`PasetoMaker`]). Both carry a
//! [`Payload`]. Passwords are stored as argon2 PHC strings.

pub mod jwt;
pub mod paseto;
pub mod password;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use jwt::JwtMaker;
pub use password::{check_password, hash_password};
pub use paseto::PasetoMaker;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TokenError {
    #[error("invalid key size: must be at least {min} characters, got {actual}")]
    InvalidKeySize { min: usize, actual: usize },

    #[error("invalid key size: must be exactly {expected} characters, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("token has expired")]
    Expired,

    #[error("token is invalid")]
    Invalid,

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("password does not match")]
    PasswordMismatch,
}

/// Data carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub id: Uuid,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

impl Payload {
    pub fn new(username: &str, duration: Duration) -> Self {
        let issued_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            issued_at,
            expired_at: issued_at + duration,
        }
    }

    pub fn valid(&self) -> Result<(), TokenError> {
        if Utc::now() > self.expired_at {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

/// Issues and verifies access tokens
pub trait Maker: Send + Sync {
    /// Issue a token for `username` valid for `duration`
    fn create_token(&self, username: &str, duration: Duration)
    -> Result<(String, Payload), TokenError>;

    /// Decode `token`, rejecting bad signatures with `Invalid` and stale
    /// tokens with `Expired`
    fn verify_token(&self, token: &str) -> Result<Payload, TokenError>;
}

/// Token format selected in `token.token_type`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Jwt,
    #[default]
    Paseto,
}

pub fn new_maker(kind: TokenKind, symmetric_key: &str) -> Result<Arc<dyn Maker>, TokenError> {
    Ok(match kind {
        TokenKind::Jwt => Arc::new(JwtMaker::new(symmetric_key)?),
        TokenKind::Paseto => Arc::new(PasetoMaker::new(symmetric_key)?),
    })
}
