//! Core services - the orchestration layer.
//!
//! Services here drive the inference service through
//! [`crate::ports::InferenceCommandPort`] and own every piece of shared
//! state: canonical status, the error slot, conversations and the
//! auto-start flag. They don't know about concrete implementations.

mod app_core;
mod auto_start;
mod chat_orchestrator;
mod conversation_store;
mod service_controller;
mod status_poller;

#[cfg(test)]
pub(crate) mod test_support;

pub use app_core::AppCore;
pub use auto_start::{AutoStartOutcome, AutoStartPhase, AutoStartPolicy};
pub use chat_orchestrator::{
    CHAT_MAX_TOKENS, CHAT_TEMPERATURE, CHAT_TOP_P, ChatExchange, ChatOrchestrator,
};
pub use conversation_store::ConversationStore;
pub use service_controller::{LifecycleState, ServiceController};
pub use status_poller::{DEFAULT_POLL_INTERVAL, StatusPoller};
