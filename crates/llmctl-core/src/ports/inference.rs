//! Inference service command interface port.
//!
//! This port is the only way the core talks to the inference service.
//! Every method is one request/response round trip; deadlines and timeouts
//! are the implementation's business, the core never pre-empts a call.

use async_trait::async_trait;
use thiserror::Error;

use crate::contracts::{ChatRequest, ChatResponse, ModelsResponse};
use crate::domain::{ServiceConfig, ServiceStatus};

/// Errors reported by the command interface.
///
/// Variants only classify the failure; the payload is the service's
/// human-readable text and is surfaced to users unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The configuration was refused (bad identifier, bad numeric range).
    #[error("{0}")]
    InvalidConfig(String),

    /// A lifecycle or chat command was refused (e.g. missing model artifact).
    #[error("{0}")]
    Rejected(String),

    /// The command requires a running service.
    #[error("LLM service is not running")]
    NotRunning,

    /// The call failed to complete.
    #[error("{0}")]
    Transport(String),
}

/// Port for the inference service command interface.
#[async_trait]
pub trait InferenceCommandPort: Send + Sync {
    /// Send a configuration to the service.
    async fn initialize(&self, config: &ServiceConfig) -> Result<String, CommandError>;

    /// Bring the service up with the last initialized configuration.
    async fn start(&self) -> Result<String, CommandError>;

    /// Bring the service down.
    async fn stop(&self) -> Result<String, CommandError>;

    /// Snapshot the current status.
    async fn get_status(&self) -> Result<ServiceStatus, CommandError>;

    /// One chat completion exchange.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, CommandError>;

    /// Models the service can currently load.
    async fn list_models(&self) -> Result<ModelsResponse, CommandError>;

    /// Diagnostic health probe.
    async fn check_health(&self) -> Result<String, CommandError>;
}
