// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling for the quiz core and maps it to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 502 Bad Gateway: the subject provider failed (network or payload format)
    ProviderError(String),

    // 409 Conflict: no active session or no round waiting for an answer
    NoActiveSession(String),

    // 400 Bad Request: blank answer, blank player name, bad query
    ValidationError(String),

    // 500 Internal Server Error: score store read/write failure
    PersistenceError(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ProviderError(msg) => write!(f, "Subject provider error: {}", msg),
            AppError::NoActiveSession(msg) => write!(f, "No active session: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ProviderError(msg) => {
                tracing::error!("Subject provider failed: {}", msg);
                (StatusCode::BAD_GATEWAY, format!("Could not load subject: {}", msg))
            }
            AppError::NoActiveSession(msg) => (StatusCode::CONFLICT, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PersistenceError(msg) => {
                tracing::error!("Score store failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not access the score store".to_string(),
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::PersistenceError`.
/// Allows using `?` operator on blob store queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

/// A score list that does not parse is a persistence problem, not a client one.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::PersistenceError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ProviderError(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::ProviderError(err.to_string())
    }
}
