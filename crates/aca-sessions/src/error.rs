//! Error types for aca-sessions.

use thiserror::Error;

/// Result type alias for aca-sessions operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during session operations.
///
/// The variants distinguish credential failures, network-level transport
/// failures, and remote rejections so callers can layer their own retry or
/// circuit-breaking policies without guessing the failure class. Nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying credential source failed to issue a token.
    #[error("credential error: {0}")]
    Credential(String),

    /// Network-level failure delivering a request.
    #[error("error sending request to {url}: {source}")]
    Transport {
        /// The target URL of the failed request.
        url: String,
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The remote service answered with a non-success status.
    #[error("request to {url} failed with status code {status}: {reason}. Response: {body}")]
    RemoteService {
        /// The target URL of the rejected request.
        url: String,
        /// Numeric HTTP status code.
        status: u16,
        /// Reason phrase for the status code.
        reason: String,
        /// Response body, read before the status assertion.
        body: String,
    },

    /// The operation was cancelled, e.g. the admission gate was closed.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid configuration provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the error is a remote rejection with the given status code.
    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, Error::RemoteService { status, .. } if *status == code)
    }
}
