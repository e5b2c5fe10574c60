//! Command-line front end for llmctl.
//!
//! The binary in `main.rs` parses arguments, calls [`bootstrap`] and hands
//! the resulting [`CliContext`] to one of the [`handlers`].

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap, build_context};
pub use commands::Commands;
pub use config_commands::{ConfigCommand, ConfigSetArgs};
pub use error::CliError;
pub use parser::Cli;
