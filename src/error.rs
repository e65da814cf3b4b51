//! Crate error types
//!
//! Everything a relay operation can fail with. Request-level failures
//! (`Validation`, `NotLoaded`) map onto HTTP responses; the rest surface at
//! startup or stay inside the push path. No variant is fatal to the process
//! once the server is up.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relay operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range request body; names the offending field.
    #[error("invalid field `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// Project document requested but none was configured at startup.
    #[error("no project document loaded")]
    NotLoaded,

    /// Push-channel transport failure on a single subscriber connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// Project document could not be read or parsed at startup.
    #[error("project file {path:?}: {reason}")]
    Project { path: PathBuf, reason: String },

    /// Socket-level failure (bind, accept, serve).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `Validation` error for one named field.
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::Validation { field, .. } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": { "field": field, "message": self.to_string() } }),
            ),
            Error::NotLoaded => (
                StatusCode::NOT_FOUND,
                json!({ "error": { "message": self.to_string() } }),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": { "message": self.to_string() } }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
