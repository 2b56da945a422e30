/// Application Error Handling
///
/// Every error that can reach an HTTP response is an `AppError`. The engine's
/// closed `AuthError` set is wrapped as-is; collaborator errors never get here.
/// Each error is logged once, inside the request span opened by `RequestLogger`,
/// and rendered as `ErrorResponse` carrying the same error id as the log line.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::auth::AuthError;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Request body validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(&'static str),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing required config: {0}")]
    MissingRequired(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Missing, malformed or expired access token on a protected route
    #[error("Invalid or expired access token")]
    Token,
    #[error(transparent)]
    Config(#[from] ConfigurationError),
    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, error_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, error_id: &str);
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", e.to_string())
                }
                AuthError::InvalidOrExpiredRefreshToken => {
                    (StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN", e.to_string())
                }
                AuthError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND", e.to_string()),
                AuthError::IssuanceFailed => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TOKEN_ISSUANCE_FAILED",
                    e.to_string(),
                ),
                AuthError::DeletionFailed => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "LOGOUT_FAILED", e.to_string())
                }
            },
            AppError::Token => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID", self.to_string()),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, error_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.classify();
        let error_response =
            ErrorResponse::new(error_id.to_string(), message, code.to_string(), status.as_u16());

        (status, error_response)
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Auth(e @ (AuthError::IssuanceFailed | AuthError::DeletionFailed)) => {
                tracing::error!(error_id = error_id, error = %e, "Authentication failure");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication error");
            }
            AppError::Token => {
                tracing::warn!(error_id = error_id, "Rejected access token");
            }
            AppError::Config(e) => {
                tracing::error!(error_id = error_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &error_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}
