//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process, HTTP or filesystem types in any signature
//! - Intent-based methods for the command interface (not implementation-leaking)
//! - Only human-readable text crosses the command boundary inside errors

pub mod clock;
pub mod config_store;
pub mod inference;

use thiserror::Error;
use uuid::Uuid;

pub use clock::{Clock, TokioClock};
pub use config_store::{ConfigStore, MemoryConfigStore};
pub use inference::{CommandError, InferenceCommandPort};

use crate::domain::ServiceConfigError;

/// Core error type for semantic domain errors.
///
/// This is the canonical error type used across the core domain.
/// Adapters should map this to their own error types (CLI exit codes,
/// serialized errors).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Invalid model identifier or out-of-range numeric parameter.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Initialize/start/stop rejected by the service.
    #[error("{0}")]
    Lifecycle(String),

    /// Chat attempted while the service is down.
    #[error("LLM service is not running")]
    NotRunning,

    /// The service answered with zero choices.
    #[error("No response received from LLM service")]
    EmptyResponse,

    /// A remote call failed or did not complete.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No conversation with the given id exists.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(Uuid),
}

impl From<CommandError> for CoreError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::InvalidConfig(msg) => Self::Config(msg),
            CommandError::Rejected(msg) => Self::Lifecycle(msg),
            CommandError::NotRunning => Self::NotRunning,
            CommandError::Transport(msg) => Self::Transport(msg),
        }
    }
}

impl From<ServiceConfigError> for CoreError {
    fn from(err: ServiceConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
