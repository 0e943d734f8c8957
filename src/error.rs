use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Failures surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The match store failed while serving the request.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No match store is installed.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Request rejected by the draw policy.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The request conflicts with the stored data, e.g. a duplicate registration.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The match changed between read and write and the retries ran out.
    #[error("concurrent modification: {0}")]
    Conflict(String),
    /// Unknown match or participant.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { message } => ServiceError::Conflict(message),
            other => ServiceError::Unavailable(other),
        }
    }
}

/// Errors rendered as HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400
    #[error("bad request: {0}")]
    BadRequest(String),
    /// 404
    #[error("not found: {0}")]
    NotFound(String),
    /// 409
    #[error("conflict: {0}")]
    Conflict(String),
    /// 503
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// HTTP status and machine-readable code.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) | ServiceError::Conflict(message) => {
                AppError::Conflict(message)
            }
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.classify();
        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
