/// Authentication Error Types
///
/// `AuthError` is the closed set of outcomes the authentication engine reports
/// to its callers. `StoreError` and `TokenError` belong to the collaborators
/// (record store, refresh token store, token issuer) and are always mapped into
/// `AuthError` before leaving the engine.

use thiserror::Error;

/// Failures reported by `AuthService`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong password. Both cases are deliberately identical.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token minting or refresh token persistence failed during login or refresh.
    #[error("failed to issue tokens")]
    IssuanceFailed,

    /// No stored refresh token, an expired one, or a value that does not match.
    #[error("invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,

    /// The refresh token was honoured but the account no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// The refresh token entry could not be removed; logout did not complete.
    #[error("failed to delete refresh token")]
    DeletionFailed,
}

/// Failures reported by the record store and the expiring key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("store call exceeded its deadline")]
    Timeout,

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Failures reported by the token issuer
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("invalid or expired token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}
