//! Command handlers that delegate to `AppCore`.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<(), CliError>`
//! - Thin wrappers that:
//!   1. Parse/validate CLI-specific input
//!   2. Call `AppCore` methods
//!   3. Format output for the terminal

pub mod ask;
pub mod chat;
pub mod config;
pub mod health;
pub mod models;
pub mod paths;
pub mod session;
pub mod status;
