use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use carelog_service::ServiceError;

/// Errors that can occur when running the Carelog server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A service-level error surfaced through the API.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Validation and not-found messages are safe to surface; storage and
        // persistence failures return a generic message, their detail having
        // already been logged where they occurred.
        let (status, message) = match self {
            Self::Service(ServiceError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            Self::Service(ServiceError::RecordNotFound) => {
                (StatusCode::NOT_FOUND, "record not found".to_owned())
            }
            Self::Service(ServiceError::BlobNotFound) => {
                (StatusCode::NOT_FOUND, "blob not found".to_owned())
            }
            Self::Service(ServiceError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage error".to_owned())
            }
            Self::Service(ServiceError::Persistence(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database error".to_owned(),
            ),
            Self::Config(_) | Self::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_owned(),
            ),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
