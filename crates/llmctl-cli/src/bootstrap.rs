//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Path resolution (via llmctl-runtime)
//! - llama-server command port and JSON config store (via llmctl-runtime)
//! - Core services (via llmctl-core)
//!
//! Command handlers receive the fully-composed context and delegate work to
//! `AppCore`.

use std::sync::Arc;

use llmctl_core::AppCore;
use llmctl_runtime::{JsonFileConfigStore, LlamaServerCommand, LlamaServerOptions, RuntimePaths};
use tracing::debug;

use crate::error::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit models directory (`--models-dir`).
    pub models_dir: Option<String>,
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// The core application facade.
    pub app: AppCore,
    /// Paths the adapters were built with.
    pub paths: RuntimePaths,
}

impl CliContext {
    /// Access the `AppCore`.
    pub const fn app(&self) -> &AppCore {
        &self.app
    }

    pub const fn paths(&self) -> &RuntimePaths {
        &self.paths
    }
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext, CliError> {
    let paths = RuntimePaths::resolve(config.models_dir.as_deref())?;
    Ok(build_context(paths))
}

/// Wire the adapters for already-resolved paths.
pub fn build_context(paths: RuntimePaths) -> CliContext {
    debug!(
        models_dir = %paths.models_dir.display(),
        config = %paths.config_path.display(),
        "Bootstrapping CLI"
    );
    let command = Arc::new(LlamaServerCommand::new(LlamaServerOptions::from_paths(&paths)));
    let store = Arc::new(JsonFileConfigStore::new(paths.config_path.clone()));
    CliContext {
        app: AppCore::new(command, store),
        paths,
    }
}
