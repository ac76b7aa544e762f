//! Client-side error taxonomy for the remote file-store API.
//!
//! Every variant carries the exact message a user should see; callers surface
//! `Display` output directly (page-level banner, CLI stderr) without further
//! mapping.

use thiserror::Error;

/// Errors surfaced by [`crate::services::file_service::FileService`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure — no response reached the server.
    #[error("Network error. Please check your connection.")]
    Network(#[source] reqwest::Error),

    /// The server rejected an upload as a duplicate but returned no record id,
    /// so there is nothing usable to hand back.
    #[error("This file already exists in the system. A reference will be created.")]
    DuplicateFile,

    /// A server-provided `error` body, surfaced verbatim. This is how
    /// "Cannot delete original file while references exist" reaches the user.
    #[error("{message}")]
    Server { message: String },

    /// Generic per-operation fallback when the server gave us nothing better.
    #[error("{0}")]
    Operation(&'static str),

    /// A response body that could not be decoded as the expected shape.
    #[error("Unexpected response from server")]
    Decode(#[from] serde_json::Error),

    /// Local filesystem failure while saving a download.
    #[error("Failed to save downloaded file: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Build the error for a non-2xx response body, preferring the server's
    /// own `error` field and falling back to the per-operation message.
    pub fn from_error_body(body: &serde_json::Value, fallback: &'static str) -> Self {
        match body.get("error").and_then(|v| v.as_str()) {
            Some(message) => ApiError::Server {
                message: message.to_string(),
            },
            None => ApiError::Operation(fallback),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
