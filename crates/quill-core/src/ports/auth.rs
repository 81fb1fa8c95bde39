//! Authentication ports.

use crate::domain::Role;

/// Claims carried by a signed bearer credential.
#[derive(Debug, Clone, Copy)]
pub struct TokenClaims {
    pub user_id: i64,
    pub role: Role,
}

/// Credential issuance and verification.
pub trait TokenService: Send + Sync {
    /// Sign a credential for the given user.
    fn sign(&self, user_id: i64, role: Role) -> Result<String, AuthError>;

    /// Verify a credential and decode its claims. Expired or tampered
    /// tokens fail with `TokenExpired` / `InvalidToken`.
    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// One-way hash of a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("missing authorization header")]
    MissingAuth,

    #[error("hashing error: {0}")]
    HashingError(String),
}
