use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Errors returned by tool and resource invocations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Caller input failed validation. Never retried.
    #[error("{0}")]
    Validation(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// State conflict detected before reaching upstream.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authentication,
    NotFound,
    Conflict,
    Timeout,
    UpstreamUnavailable,
    UnknownTool,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized `{kind, detail}` form of a `ToolError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub detail: String,
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::Validation(_) => ErrorKind::Validation,
            ToolError::UnknownTool(_) => ErrorKind::UnknownTool,
            ToolError::UnknownResource(_) => ErrorKind::NotFound,
            ToolError::Conflict(_) => ErrorKind::Conflict,
            ToolError::Internal(_) => ErrorKind::Internal,
            ToolError::Upstream(err) => match err {
                UpstreamError::Authentication { .. } => ErrorKind::Authentication,
                UpstreamError::NotFound(_) => ErrorKind::NotFound,
                UpstreamError::Conflict(_) => ErrorKind::Conflict,
                UpstreamError::Rejected(_) => ErrorKind::Validation,
                UpstreamError::Timeout(_) => ErrorKind::Timeout,
                UpstreamError::Connection(_)
                | UpstreamError::Unavailable { .. }
                | UpstreamError::RetriesExhausted { .. } => ErrorKind::UpstreamUnavailable,
                UpstreamError::ParseError(_) | UpstreamError::Client(_) => ErrorKind::Internal,
            },
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind(),
            detail: self.to_string(),
        }
    }
}
