//! Configuration management subcommands.

use std::path::PathBuf;

use clap::Subcommand;
use llmctl_core::AppConfigUpdate;

/// Configuration management commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the stored configuration
    Show,
    /// Reset the configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Update individual settings
    Set(ConfigSetArgs),
}

/// Fields accepted by `config set`. Omitted flags leave the value unchanged.
#[derive(clap::Args, Debug, Default)]
pub struct ConfigSetArgs {
    /// Start the service automatically when a session begins
    #[arg(long)]
    pub auto_start: Option<bool>,
    /// Number of auto-start attempts (0 disables retries entirely)
    #[arg(long)]
    pub retry_attempts: Option<u32>,
    /// Delay between auto-start attempts, in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,
    /// Model identifier (file stem in the models directory)
    #[arg(long)]
    pub model: Option<String>,
    /// Explicit path to the model weights
    #[arg(long, conflicts_with = "clear_model_path")]
    pub model_path: Option<PathBuf>,
    /// Forget the explicit model path
    #[arg(long)]
    pub clear_model_path: bool,
    /// Sampling temperature (0-2)
    #[arg(long)]
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold (0-1)
    #[arg(long)]
    pub top_p: Option<f32>,
    /// Maximum tokens per completion
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Context window size
    #[arg(long)]
    pub ctx_size: Option<u32>,
    /// CPU threads for inference
    #[arg(long, conflicts_with = "clear_threads")]
    pub threads: Option<u32>,
    /// Let llama-server pick the thread count
    #[arg(long)]
    pub clear_threads: bool,
    /// Layers to offload to the GPU
    #[arg(long)]
    pub gpu_layers: Option<u32>,
}

fn clearable<T: Clone>(value: Option<&T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(|v| Some(v.clone()))
    }
}

impl ConfigSetArgs {
    pub fn to_update(&self) -> AppConfigUpdate {
        AppConfigUpdate {
            auto_start_enabled: self.auto_start,
            retry_attempts: self.retry_attempts,
            retry_delay_ms: self.retry_delay_ms,
            model_name: self.model.clone(),
            model_path: clearable(self.model_path.as_ref(), self.clear_model_path),
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            ctx_size: self.ctx_size,
            n_threads: clearable(self.threads.as_ref(), self.clear_threads),
            n_gpu_layers: self.gpu_layers,
        }
    }

    /// Whether no flag was given at all.
    pub fn is_empty(&self) -> bool {
        let update = self.to_update();
        update.auto_start_enabled.is_none()
            && update.retry_attempts.is_none()
            && update.retry_delay_ms.is_none()
            && update.model_name.is_none()
            && update.model_path.is_none()
            && update.temperature.is_none()
            && update.top_p.is_none()
            && update.max_tokens.is_none()
            && update.ctx_size.is_none()
            && update.n_threads.is_none()
            && update.n_gpu_layers.is_none()
    }
}
