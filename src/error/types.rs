//! Error type definitions.
//!
//! The taxonomy is deliberately flat: validation (400), credential problems
//! (401), ownership problems (403), missing records (404), duplicate unique
//! fields (400, the contract the client expects), upstream translation
//! failures (500), and everything else (500).

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by HTTP handlers and the realtime layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Missing/invalid credential, or an action the caller may not perform.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to touch this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Referenced document does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate value for a unique field.
    #[error("{0}")]
    Conflict(String),

    /// The translation provider was unreachable or answered non-success.
    #[error("{0}")]
    Upstream(String),

    /// Store failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message string sent to the client.
    pub fn message(&self) -> String {
        match self {
            // Store internals stay out of client responses.
            Self::Database(e) => {
                tracing::error!("database error: {e:?}");
                "Server Error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(e: bcrypt::BcryptError) -> Self {
        Self::Internal(format!("password hashing failed: {e}"))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized("Not authorized to access this route".to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("serialization error: {e}"))
    }
}

/// True when a store error is a UNIQUE constraint violation, used to turn
/// duplicate usernames/emails into a 400 instead of a 500.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
