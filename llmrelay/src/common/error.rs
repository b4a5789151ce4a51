//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! `RelayError`は`status_code()`と`external_message()`を提供し、
//! HTTPレスポンスへのマッピングはAPI層の一箇所で行う。

use axum::http::StatusCode;
use thiserror::Error;

/// relay error type
#[derive(Debug, Error)]
pub enum RelayError {
    /// Validation error (missing/malformed input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate endpoint name)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a message safe to send to external clients.
    ///
    /// Validation, conflict and not-found messages describe caller mistakes
    /// and are returned verbatim. Database and internal messages may contain
    /// paths or upstream detail, so only a generic message goes out; the full
    /// error is logged server-side.
    pub fn external_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Conflict(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Database(_) => "Storage error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> Self {
        RelayError::Database(err.to_string())
    }
}

/// Result type alias
pub type RelayResult<T> = Result<T, RelayError>;
