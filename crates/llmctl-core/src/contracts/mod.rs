//! Wire contracts shared with the inference service.
//!
//! These mirror the `OpenAI`-compatible request/response shapes spoken by
//! the command interface. Only one round trip per call; the `stream` flag
//! exists on the wire but is never set to `true` by this crate.

mod openai;

pub use openai::{ChatChoice, ChatRequest, ChatResponse, ChatUsage, ModelInfo, ModelsResponse};
