//! Error types for the lead API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lead_store::DatabaseError;
use thiserror::Error;

/// Errors that can occur while serving lead requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Lead store error.
    #[error("{0}")]
    Database(#[from] DatabaseError),

    /// Malformed request parameters.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(DatabaseError::Duplicate { .. }) => StatusCode::CONFLICT,
            ApiError::Database(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Database(DatabaseError::Import(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(DatabaseError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Database error: {}", self);
        } else {
            tracing::debug!(status = %status, "Request rejected: {}", self);
        }

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
