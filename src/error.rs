//! Error types for the match tracker service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific match tracking scenarios
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Unknown draw: {name}")]
    UnknownDraw { name: String },

    #[error("Invalid submission: {reason}")]
    InvalidSubmission { reason: String },

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Scoreboard error: {reason}")]
    Scoreboard { reason: String },

    #[error("Spreadsheet request failed: {message}")]
    SheetRequestFailed { message: String },

    #[error("Sheet not found: {title}")]
    SheetNotFound { title: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl TrackerError {
    /// Shorthand for a rejected submission
    pub fn invalid_submission(reason: impl Into<String>) -> Self {
        Self::InvalidSubmission {
            reason: reason.into(),
        }
    }

    /// Shorthand for a rejected caller
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }
}
