//! Core domain types, ports and orchestration services for llmctl.
//!
//! This crate owns the service lifecycle state machine, the auto-start
//! policy, the status poller and the conversation state built on top of a
//! locally running inference service. It contains no process, HTTP or
//! filesystem code: those live behind the traits in [`ports`] and are
//! provided by adapter crates.

pub mod contracts;
pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use contracts::{
    ChatChoice, ChatRequest, ChatResponse, ChatUsage, ModelInfo, ModelsResponse,
};
pub use domain::{
    ChatMessage, Conversation, MessageRole, ServiceConfig, ServiceConfigError, ServiceStatus,
    validate_service_config,
};
pub use ports::{
    Clock, CommandError, ConfigStore, CoreError, InferenceCommandPort, MemoryConfigStore,
    TokioClock,
};
pub use services::{
    AppCore, AutoStartOutcome, AutoStartPhase, AutoStartPolicy, ChatExchange, ChatOrchestrator,
    ConversationStore, DEFAULT_POLL_INTERVAL, LifecycleState, ServiceController, StatusPoller,
};
pub use settings::{AppConfig, AppConfigUpdate, validate_app_config};
