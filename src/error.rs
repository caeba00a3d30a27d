//! Error types for Cliptide
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input (400)
    #[error("{0}")]
    BadRequest(String),

    /// Validation error with per-field detail (400)
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },

    /// Missing, invalid or expired credential (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not the owner (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (409)
    #[error("{0}")]
    Conflict(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Media storage error (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Map a SQLx error, translating unique-constraint violations
    /// to `Conflict` with the given message.
    pub fn from_unique_violation(err: sqlx::Error, conflict_message: &str) -> Self {
        if is_unique_violation(&err) {
            AppError::Conflict(conflict_message.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

/// Check whether a SQLx error is a unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().map(|db| db.kind()),
        Some(sqlx::error::ErrorKind::UniqueViolation)
    )
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Every failure is shaped as `{statusCode, message, success: false}`
    /// with an optional validation-error list. Internal details are
    /// logged and never leaked to clients.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, message, error_type, errors) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "bad_request", None)
            }
            AppError::Validation { message, errors } => (
                StatusCode::BAD_REQUEST,
                message.clone(),
                "validation",
                Some(errors.clone()),
            ),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "unauthorized", None)
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), "forbidden", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), "not_found", None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), "conflict", None),
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    "database",
                    None,
                )
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Media storage error".to_string(),
                    "storage",
                    None,
                )
            }
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg.clone(),
                "config",
                None,
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "internal",
                    None,
                )
            }
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let mut body = serde_json::json!({
            "statusCode": status.as_u16(),
            "message": message,
            "success": false,
        });
        if let Some(errors) = errors {
            body["errors"] = serde_json::json!(errors);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
