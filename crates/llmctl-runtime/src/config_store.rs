//! JSON file implementation of `ConfigStore`.
//!
//! Storage failures never reach the caller: they are logged and the
//! defaults are used instead.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use llmctl_core::{AppConfig, ConfigStore};
use tokio::fs;
use tracing::{debug, warn};

/// Persists [`AppConfig`] as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileConfigStore {
    path: PathBuf,
}

impl JsonFileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, config: &AppConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(config)?;
        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for JsonFileConfigStore {
    async fn load(&self) -> AppConfig {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored configuration, using defaults");
                return AppConfig::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read configuration");
                return AppConfig::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Stored configuration is invalid, using defaults");
            AppConfig::default()
        })
    }

    async fn save(&self, config: &AppConfig) {
        if let Err(e) = self.write(config).await {
            warn!(path = %self.path.display(), error = %e, "Failed to save configuration");
        }
    }

    async fn reset(&self) -> AppConfig {
        match fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Stored configuration removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove configuration"),
        }
        AppConfig::default()
    }
}
