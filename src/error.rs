//! Custom error types for borg-overlay
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for borg-overlay operations
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Archive pattern rejected before any external tool was invoked
    #[error("Invalid archive pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// An external tool could not be spawned, exited non-zero, or printed garbage
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors for paths and plans
    #[error("Validation error: {0}")]
    Validation(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Operator declined a confirmation prompt
    #[error("Aborted: {0}")]
    Aborted(String),
}

impl OverlayError {
    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create an external tool error
    pub fn external(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Check if this is an invalid pattern error
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. })
    }

    /// Check if this is an external tool error
    pub fn is_external_tool(&self) -> bool {
        matches!(self, Self::ExternalTool { .. })
    }
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for borg-overlay operations
pub type OverlayResult<T> = Result<T, OverlayError>;
