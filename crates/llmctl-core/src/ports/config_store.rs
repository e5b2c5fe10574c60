//! Persistent configuration store port.
//!
//! The store never propagates failures: implementations catch and log
//! storage errors internally and fall back to default values.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::settings::AppConfig;

/// Key-value store holding the application configuration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration merged over defaults.
    ///
    /// Returns defaults if nothing is stored or the stored data is unreadable.
    async fn load(&self) -> AppConfig;

    /// Persist the configuration.
    async fn save(&self, config: &AppConfig);

    /// Remove stored data and return the defaults.
    async fn reset(&self) -> AppConfig;
}

/// In-process [`ConfigStore`], used for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    stored: Mutex<Option<AppConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `config`.
    pub fn with_config(config: AppConfig) -> Self {
        Self {
            stored: Mutex::new(Some(config)),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> AppConfig {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default()
    }

    async fn save(&self, config: &AppConfig) {
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
    }

    async fn reset(&self) -> AppConfig {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        AppConfig::default()
    }
}
