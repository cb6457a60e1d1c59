//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] souq_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Account has been deactivated.
    #[error("account is disabled")]
    AccountDisabled,

    /// Bearer token is malformed, badly signed, or expired.
    #[error("invalid token")]
    InvalidToken,

    /// Token predates the user's last password change.
    #[error("token issued before password change")]
    StaleToken,

    /// Password-reset code doesn't match.
    #[error("invalid reset code")]
    InvalidResetCode,

    /// Password-reset code has expired.
    #[error("reset code expired")]
    ResetCodeExpired,

    /// Password reset attempted before the code was verified.
    #[error("reset code not verified")]
    ResetNotVerified,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token signing error.
    #[error("token signing error: {0}")]
    TokenSigning(#[from] jsonwebtoken::errors::Error),
}
