use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::room::RoomError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// No room is registered under the requested identifier.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// A queue index fell outside the queue.
    #[error("queue index {index} out of range (queue length {len})")]
    InvalidIndex {
        /// Index supplied by the caller.
        index: usize,
        /// Queue length when the request was applied.
        len: usize,
    },
}

impl From<RoomError> for ServiceError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::InvalidIndex { index, len } => ServiceError::InvalidIndex { index, len },
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::RoomNotFound(_) => AppError::NotFound(err.to_string()),
            ServiceError::InvalidIndex { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

/// JSON body returned alongside every error status.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable description of the failure.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
