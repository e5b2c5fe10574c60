//! CLI-specific error types and mappings.
//!
//! This module provides error types for the CLI adapter and mappings
//! from `CoreError` to exit codes and user-facing messages.

use llmctl_core::CoreError;
use llmctl_runtime::PathError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Core domain error.
    #[error("{0}")]
    Core(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The inference service could not be brought up or is down.
    #[error("Service error: {0}")]
    Service(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Service(_) => 69,  // EX_UNAVAILABLE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(msg) => Self::Config(msg),
            CoreError::Lifecycle(msg) => Self::Service(msg),
            CoreError::NotRunning => Self::Service(err.to_string()),
            CoreError::ConversationNotFound(_) => Self::Arguments(err.to_string()),
            CoreError::EmptyResponse | CoreError::Transport(_) => Self::Core(err.to_string()),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Core(err.to_string())
    }
}
