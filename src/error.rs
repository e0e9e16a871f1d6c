//! Error types for the record service
//!
//! Store and cache adapters report their own error types so callers can tell
//! "backend down" apart from "key absent" (absence is always `Ok(None)`).
//! `AppError` is what crosses the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error ==
/// Failure talking to the durable record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connectivity or query failure
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

// == Cache Error ==
/// Failure talking to the cache store.
///
/// Never surfaced to API callers; the read path and write coordinator log it
/// and fall back to the record store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Connectivity or command failure
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded
    #[error("Corrupt cache entry for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Backend refused the entry (size or key limits)
    #[error("Cache rejected entry: {0}")]
    Rejected(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

// == App Error ==
/// Error type returned by service operations and HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed input row, id, or request body
    #[error("Validation error: {0}")]
    Validation(String),

    /// Target key does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Durable store failed; the operation did not complete
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// Ingestion queue is full
    #[error("Service busy: {0}")]
    Busy(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for service operations.
pub type Result<T> = std::result::Result<T, AppError>;
