//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses. Every failure surfaces to the client as a
//! `{"success": false, "message": "..."}` body with the status code implied
//! by the error's tag.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::config::ConfigError;
use fee_queue_core::error::CoreError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the core services.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// The authenticated account does not hold the role a route requires.
    #[error("{0}")]
    Forbidden(String),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from JSON encoding, e.g. while signing a
    /// credential.
    #[error("Serialization Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network
    /// socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The canonical error body, shared by every endpoint.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(core) => match core {
                CoreError::Validation(_) | CoreError::NotFound(_) => StatusCode::BAD_REQUEST,
                CoreError::InvalidCredentials
                | CoreError::InvalidToken
                | CoreError::InactiveAccount => StatusCode::UNAUTHORIZED,
                CoreError::InvalidState(_) => StatusCode::CONFLICT,
                CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Json(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the log; the client sees a generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}
