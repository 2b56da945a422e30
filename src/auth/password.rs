/// Password Hashing and Verification
///
/// bcrypt does the constant-time comparison. Every failure, including a
/// malformed stored hash, collapses into a single credential mismatch.
/// Logins for unknown emails verify against a fixed hash of the same cost, so
/// both paths pay the same work factor.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

use crate::auth::errors::AuthError;

lazy_static! {
    static ref DUMMY_HASH: String =
        hash("session-auth-placeholder", DEFAULT_COST).expect("Failed to hash placeholder password");
}

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Verify a password against its stored hash
///
/// # Errors
/// Returns `AuthError::InvalidCredentials` on mismatch or an unusable hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AuthError> {
    match verify(password, password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials),
        Err(e) => {
            tracing::debug!(error = %e, "Stored password hash could not be used");
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Verify on the blocking pool so bcrypt's work factor does not stall async workers
pub async fn verify_password_blocking(
    password: String,
    password_hash: String,
) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            AuthError::InvalidCredentials
        })?
}

/// Burn one verification against the placeholder hash; always a mismatch
pub async fn verify_placeholder_blocking(password: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || {
        verify_password(&password, &DUMMY_HASH)?;
        Err(AuthError::InvalidCredentials)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Password verification task failed");
        AuthError::InvalidCredentials
    })?
}
