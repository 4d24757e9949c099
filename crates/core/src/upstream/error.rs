use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the upstream service.
///
/// Messages are built from status codes and scrubbed response bodies; the
/// API key never appears in them.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Upstream rejected the API key (401/403).
    #[error("Upstream rejected the API key (HTTP {status})")]
    Authentication { status: u16 },

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// State conflict, e.g. adding a movie twice (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream refused the request as invalid (400/422).
    #[error("Upstream rejected the request: {0}")]
    Rejected(String),

    /// No response within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream host could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Upstream answered with a server error (5xx).
    #[error("Upstream unavailable: HTTP {status} - {message}")]
    Unavailable { status: u16, message: String },

    /// A read kept failing until the retry budget ran out.
    #[error("Upstream unavailable after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<UpstreamError>,
    },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request could not be built or sent for a local reason.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl UpstreamError {
    /// Transient failures a read may be retried on.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UpstreamError::Timeout(_)
                | UpstreamError::Connection(_)
                | UpstreamError::Unavailable { .. }
        )
    }

    /// Short label used for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            UpstreamError::Authentication { .. } => "authentication",
            UpstreamError::NotFound(_) => "not_found",
            UpstreamError::Conflict(_) => "conflict",
            UpstreamError::Rejected(_) => "rejected",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Connection(_) => "connection",
            UpstreamError::Unavailable { .. } => "unavailable",
            UpstreamError::RetriesExhausted { .. } => "retries_exhausted",
            UpstreamError::ParseError(_) => "parse_error",
            UpstreamError::Client(_) => "client_error",
        }
    }
}
