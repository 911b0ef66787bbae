//! Error types for the device registry
//!
//! Store failures are the only errors that reach callers of the cache-aside
//! layer. Cache and bus failures are absorbed there and only ever logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::validation::ErrorCode;
use crate::models::ErrorResponse;

// == Store Error ==
/// Failure reported by the persistent record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store unreachable or failed while serving the request
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// More than one record carries the same secondary key
    #[error("Secondary key is not unique: {0}")]
    NotUnique(String),
}

// == Cache Error ==
/// Failure while talking to the shared cache. Never surfaced to clients.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache backend unreachable or failed
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Call did not complete within the configured bound
    #[error("Cache call timed out after {0} ms")]
    Timeout(u64),

    /// Snapshot could not be encoded or decoded
    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Bus Error ==
/// Failure while publishing an invalidation event. Never surfaced to clients.
#[derive(Error, Debug)]
pub enum BusError {
    /// Publish was refused by the bus
    #[error("Invalidation publish failed: {0}")]
    Publish(String),

    /// Call did not complete within the configured bound
    #[error("Invalidation publish timed out after {0} ms")]
    Timeout(u64),
}

// == API Error ==
/// Error returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Record not found
    #[error("{}", .0.message())]
    NotFound(ErrorCode),

    /// Request failed a validation rule
    #[error("{}", .0.message())]
    Validation(ErrorCode),

    /// Malformed request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Propagated store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotFound(code) => (StatusCode::NOT_FOUND, ErrorResponse::from_code(*code)),
            ApiError::Validation(code) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::from_code(*code))
            }
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("400", msg.clone()))
            }
            ApiError::Store(StoreError::NotUnique(_)) => (
                StatusCode::CONFLICT,
                ErrorResponse::new("409", self.to_string()),
            ),
            ApiError::Store(StoreError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::new("503", self.to_string()),
            ),
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
