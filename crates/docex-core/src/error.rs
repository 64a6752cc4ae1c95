//! Error types module
//!
//! Errors raised while submitting a document and while loading configuration.
//! Validation errors live next to the validation contract in [`crate::validation`].
//!
//! Every error that can reach the user implements [`ErrorMetadata`], which
//! separates what gets logged from what gets rendered.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Message rendered for every failed extraction request.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to process file";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Warning level - for recoverable issues like a failing backend
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error presentation - defines how an error is shown and logged
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "NETWORK_ERROR")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// The two classes of submit failure. The user sees the same message for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitErrorKind {
    Network,
    MalformedResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error(
        "Extraction request failed with status {status}: {}",
        .detail.as_deref().unwrap_or("no detail")
    )]
    HttpStatus { status: u16, detail: Option<String> },

    #[error("Extraction request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),
}

impl SubmitError {
    pub fn kind(&self) -> SubmitErrorKind {
        match self {
            SubmitError::MalformedResponse(_) => SubmitErrorKind::MalformedResponse,
            SubmitError::Transport(_)
            | SubmitError::HttpStatus { .. }
            | SubmitError::Timeout(_)
            | SubmitError::ReadFile { .. } => SubmitErrorKind::Network,
        }
    }
}

impl ErrorMetadata for SubmitError {
    fn error_code(&self) -> &'static str {
        match self {
            SubmitError::Transport(_) => "NETWORK_ERROR",
            SubmitError::HttpStatus { .. } => "HTTP_STATUS_ERROR",
            SubmitError::Timeout(_) => "TIMEOUT",
            SubmitError::ReadFile { .. } => "FILE_READ_ERROR",
            SubmitError::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }

    fn client_message(&self) -> String {
        GENERIC_FAILURE_MESSAGE.to_string()
    }

    fn log_level(&self) -> LogLevel {
        match self {
            SubmitError::ReadFile { .. } => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid API URL '{0}': must start with http:// or https://")]
    InvalidApiUrl(String),

    #[error("Invalid API prefix '{0}': must start with '/'")]
    InvalidApiPrefix(String),

    #[error("{name} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { name: &'static str, value: String },
}
