//! Service error types with HTTP status code mapping.
//!
//! [`ChatError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::UserId;
use crate::pool::PoolError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2004,
///     "message": "user 7 has not installed a public key"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the table on [`ChatError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                   |
/// |-----------|------------------|-------------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request / 409 Conflict |
/// | 2000–2999 | Auth / Not Found | 401 / 403 / 404               |
/// | 3000–3999 | Server           | 500 / 503                     |
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Sign-up with a username that is already registered.
    #[error("username already exists: {0}")]
    UsernameTaken(String),

    /// Username or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or expired access token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No account with the given id.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The counterpart has not installed a public key for the caller yet.
    #[error("user {0} has not installed a public key")]
    KeyNotInstalled(UserId),

    /// Database failure.
    #[error("database error: {0}")]
    Database(String),

    /// The connection pool is shutting down.
    #[error("connection pool is closed")]
    PoolClosed,

    /// No database connection became available in time.
    #[error("timed out waiting for a database connection")]
    PoolTimeout,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UsernameTaken(_) => 1002,
            Self::InvalidCredentials => 2001,
            Self::Unauthorized(_) => 2002,
            Self::UserNotFound(_) => 2003,
            Self::KeyNotInstalled(_) => 2004,
            Self::Internal(_) => 3000,
            Self::Database(_) => 3001,
            Self::PoolClosed => 3002,
            Self::PoolTimeout => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UsernameTaken(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::UserNotFound(_) | Self::KeyNotInstalled(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PoolClosed | Self::PoolTimeout => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<sqlx::Error> for ChatError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<PoolError<sqlx::Error>> for ChatError {
    fn from(e: PoolError<sqlx::Error>) -> Self {
        match e {
            PoolError::Closed => Self::PoolClosed,
            PoolError::Create(e) => Self::Database(e.to_string()),
            PoolError::InvalidConfig { .. } => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
