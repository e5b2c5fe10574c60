//! Domain types for the inference service and chat conversations.
//!
//! These are pure data types with no infrastructure dependencies.

pub mod chat;
pub mod service;

pub use chat::{ChatMessage, Conversation, MessageRole};
pub use service::{
    DEFAULT_MODEL_NAME, ServiceConfig, ServiceConfigError, ServiceStatus, validate_service_config,
};
