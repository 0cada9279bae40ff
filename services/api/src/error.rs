//! services/api/src/error.rs
//!
//! Defines the primary error types for the API service: `ApiError` for
//! startup failures and `HttpError` for the per-request mapping of port
//! errors onto JSON responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use studyhub_core::ports::PortError;

use crate::config::ConfigError;

/// The primary error type for the `api` service binary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<sqlx::migrate::MigrateError> for ApiError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ApiError::Database(err.into())
    }
}

/// Wrapper that turns a `PortError` into the JSON error body handlers return.
///
/// Validation errors carry the offending field; everything else is a single
/// message. Internal details are logged, never sent to the client.
#[derive(Debug)]
pub struct HttpError(pub PortError);

impl From<PortError> for HttpError {
    fn from(err: PortError) -> Self {
        HttpError(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            PortError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "field": field }),
            ),
            PortError::NotFound(_) => {
                (StatusCode::NOT_FOUND, json!({ "error": "not found" }))
            }
            PortError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized" }))
            }
            PortError::External(detail) => {
                tracing::warn!("external service failure: {detail}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "external service unavailable, please try again" }),
                )
            }
            PortError::Unexpected(detail) => {
                tracing::error!("unexpected error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
