use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Stable, machine-readable error codes.
///
/// Responses carry `{"code": "PERMISSION_DENIED", "message": "..."}`. Clients
/// match on `code`; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const INVALID_GRAPH: &str = "INVALID_GRAPH";
    pub const MALFORMED_OBLIGATION: &str = "MALFORMED_OBLIGATION";
    pub const INTERNAL: &str = "INTERNAL";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Error type returned at the HTTP edge.
///
/// Each variant maps to one code in [`error_code`] and one HTTP status.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// No acting principal on the request. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// HTTP 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// Graph failed structural validation (cycle, dangling edge, kind rule). HTTP 422.
    #[error("{0}")]
    InvalidGraph(String),

    /// Obligation references an argument the event does not carry. HTTP 422.
    #[error("{0}")]
    MalformedObligation(String),

    /// HTTP 500.
    #[error("{0}")]
    Storage(String),

    /// HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Conflict(_) => error_code::ALREADY_EXISTS,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::Unauthorized(_) => error_code::UNAUTHENTICATED,
            ServiceError::PermissionDenied(_) => error_code::PERMISSION_DENIED,
            ServiceError::InvalidGraph(_) => error_code::INVALID_GRAPH,
            ServiceError::MalformedObligation(_) => error_code::MALFORMED_OBLIGATION,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidGraph(_) | ServiceError::MalformedObligation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Storage(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
