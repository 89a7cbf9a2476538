//! Error types for the Cortex engine
//!
//! Library code returns [`Result<T>`]; the binary wraps these in `anyhow`.
//! Query-level failures are turned into [`ErrorResponse`] values by the
//! tool server and the live channel instead of being raised to the transport.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level error enum for the engine.
#[derive(Debug, thiserror::Error)]
pub enum CortexError {
    /// Resolved path escapes the project root or touches a disallowed directory.
    #[error("Permission denied: {path} ({reason})")]
    PermissionDenied { path: PathBuf, reason: String },

    #[error("Timed out after {}ms waiting for {operation}", .after.as_millis())]
    Timeout { operation: String, after: Duration },

    #[error("A scan is already in progress")]
    ScanInProgress,

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Graph error: {0}")]
    Graph(String),

    /// Source could not be turned into a syntax tree without errors.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CortexError {
    pub fn permission_denied(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used in structured error responses.
    pub fn code(&self) -> &'static str {
        match self {
            CortexError::PermissionDenied { .. } => "permission_denied",
            CortexError::Timeout { .. } => "timeout",
            CortexError::ScanInProgress => "scan_in_progress",
            CortexError::NodeNotFound(_) => "not_found",
            CortexError::InvalidInput(_) => "invalid_input",
            CortexError::Graph(_) => "graph_error",
            CortexError::Parse(_) => "parse_error",
            CortexError::Tool(_) => "tool_error",
            CortexError::Io(_) => "io_error",
            CortexError::Json(_) => "invalid_json",
        }
    }
}

pub type Result<T> = std::result::Result<T, CortexError>;

/// Structured error returned to callers of the query surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&CortexError> for ErrorResponse {
    fn from(err: &CortexError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<CortexError> for ErrorResponse {
    fn from(err: CortexError) -> Self {
        ErrorResponse::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(CortexError::ScanInProgress.code(), "scan_in_progress");
        assert_eq!(
            CortexError::permission_denied("/etc", "outside project root").code(),
            "permission_denied"
        );
        assert_eq!(CortexError::NodeNotFound("x".into()).code(), "not_found");
    }

    #[test]
    fn test_error_response_carries_message() {
        let err = CortexError::Timeout {
            operation: "tool call scan".to_string(),
            after: Duration::from_millis(250),
        };
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "timeout");
        assert!(response.message.contains("250ms"));
        assert!(response.message.contains("tool call scan"));
    }
}
