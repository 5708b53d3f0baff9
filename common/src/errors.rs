//! Application error type.
//!
//! Every handler returns `AppResult`; the error side renders itself as the
//! standard [`ApiResponse`] error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Message shown when a lookup the request depends on fails.
pub const GENERIC_FAILURE_MESSAGE: &str = "Error in processing request";

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A request that could not be served; the message is shown verbatim.
    #[error("{0}")]
    RequestFailed(String),

    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    #[error("{0}")]
    DatabaseQuery(String),

    #[error("invalid signature for the given query")]
    InvalidSignature,

    #[error("configuration storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Failure carrying the generic user-facing message.
    pub fn processing() -> Self {
        AppError::RequestFailed(GENERIC_FAILURE_MESSAGE.to_string())
    }

    /// Stable code for client handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::RequestFailed(_) => "REQUEST_FAILED",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "QUERY_ERROR",
            AppError::InvalidSignature => "INVALID_SIGNATURE",
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::Template(_) => "TEMPLATE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::RequestFailed(_)
            | AppError::DatabaseQuery(_)
            | AppError::InvalidSignature => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageUnavailable(_) => StatusCode::CONFLICT,
            AppError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Template(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    fn public_message(&self) -> String {
        match self {
            AppError::Template(_) | AppError::Internal(_) => {
                "An internal server error occurred.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::warn!(error = %self, code = self.code(), "request rejected");
        }

        let body = ApiResponse::err(self.code(), self.public_message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_error_message() {
        let err = AppError::processing();
        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = AppError::Template("missing block".into());
        assert_eq!(err.public_message(), "An internal server error occurred.");
        assert_eq!(err.code(), "TEMPLATE_ERROR");
    }
}
