//! Runtime adapters for llmctl.
//!
//! This crate implements the ports defined in `llmctl-core` on top of the
//! operating system: a llama-server child process for the inference command
//! interface, a JSON file for the configuration store, and the path
//! resolution both of them need.

pub mod command;
pub mod config_store;
pub mod health;
pub mod llama_server;
pub mod models_dir;
pub mod paths;

pub use config_store::JsonFileConfigStore;
pub use health::{check_http_health, wait_for_http_health};
pub use llama_server::{
    DEFAULT_SERVER_PORT, DEFAULT_STARTUP_TIMEOUT, LlamaServerCommand, LlamaServerOptions,
};
pub use models_dir::{ModelFile, ModelLookupError, resolve_model_file, scan_models};
pub use paths::{PathError, PathSource, RuntimePaths};
