//! Error types for backend adapters.

use thiserror::Error;

/// Errors that can occur while calling a generative backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("request timeout after {0}s")]
    Timeout(u64),

    /// Backend returned an error response (4xx, 5xx).
    #[error("backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Backend response doesn't match the expected wire format.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Requested model class is not served by this backend.
    #[error("model class '{0}' not available")]
    UnknownModel(String),

    /// Adapter cannot be constructed from the supplied configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
