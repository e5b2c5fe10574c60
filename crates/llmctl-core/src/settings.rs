//! Application configuration consumed by the orchestration layer.
//!
//! These are pure domain types; persistence lives behind
//! [`crate::ports::ConfigStore`].

use serde::{Deserialize, Serialize};

use crate::domain::{ServiceConfig, ServiceConfigError, validate_service_config};

/// Default number of auto-start attempts.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default delay between auto-start attempts, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Application configuration.
///
/// Missing fields fall back to their defaults and unknown fields are
/// ignored, so partially written or older config files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Whether the service is brought up automatically on process start.
    pub auto_start_enabled: bool,

    /// Configuration used by auto-start and as the initial form values.
    pub default_service_config: ServiceConfig,

    /// Number of auto-start attempts (0 disables attempting entirely).
    pub retry_attempts: u32,

    /// Delay between auto-start attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auto_start_enabled: true,
            default_service_config: ServiceConfig::default(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl AppConfig {
    /// Merge a partial update into this config, only touching fields that are Some.
    pub fn merge(&mut self, update: &AppConfigUpdate) {
        if let Some(enabled) = update.auto_start_enabled {
            self.auto_start_enabled = enabled;
        }
        if let Some(attempts) = update.retry_attempts {
            self.retry_attempts = attempts;
        }
        if let Some(delay) = update.retry_delay_ms {
            self.retry_delay_ms = delay;
        }

        let service = &mut self.default_service_config;
        if let Some(ref name) = update.model_name {
            service.model_name.clone_from(name);
        }
        if let Some(ref path) = update.model_path {
            service.model_path.clone_from(path);
        }
        if let Some(temperature) = update.temperature {
            service.temperature = temperature;
        }
        if let Some(top_p) = update.top_p {
            service.top_p = top_p;
        }
        if let Some(max_tokens) = update.max_tokens {
            service.max_tokens = max_tokens;
        }
        if let Some(ctx_size) = update.ctx_size {
            service.ctx_size = ctx_size;
        }
        if let Some(threads) = update.n_threads {
            service.n_threads = threads;
        }
        if let Some(layers) = update.n_gpu_layers {
            service.n_gpu_layers = layers;
        }
    }
}

/// Partial configuration update.
///
/// `Option<Option<T>>` fields follow the usual convention:
/// - `None` = don't change this field
/// - `Some(None)` = clear the field
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfigUpdate {
    pub auto_start_enabled: Option<bool>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub model_name: Option<String>,
    pub model_path: Option<Option<std::path::PathBuf>>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub ctx_size: Option<u32>,
    pub n_threads: Option<Option<u32>>,
    pub n_gpu_layers: Option<u32>,
}

/// Validate application configuration values.
///
/// `retry_attempts = 0` is accepted; auto-start then performs no attempts.
pub fn validate_app_config(config: &AppConfig) -> Result<(), ServiceConfigError> {
    validate_service_config(&config.default_service_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();
        assert!(config.auto_start_enabled);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_ms, 2000);
        assert!(validate_app_config(&config).is_ok());
    }

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"retry_attempts": 5, "default_service_config": {"model_name": "tiny"}, "theme": "dark"}"#,
        )
        .unwrap();
        assert_eq!(config.retry_attempts, 5);
        assert!(config.auto_start_enabled);
        assert_eq!(config.default_service_config.model_name, "tiny");
        assert_eq!(config.default_service_config.max_tokens, 512);
    }

    #[test]
    fn test_merge_update() {
        let mut config = AppConfig::default();
        config.default_service_config.n_threads = Some(4);

        let update = AppConfigUpdate {
            auto_start_enabled: Some(false),
            model_name: Some("other".to_string()),
            n_threads: Some(None),
            ..Default::default()
        };
        config.merge(&update);

        assert!(!config.auto_start_enabled);
        assert_eq!(config.default_service_config.model_name, "other");
        assert_eq!(config.default_service_config.n_threads, None);
        assert_eq!(config.retry_attempts, DEFAULT_RETRY_ATTEMPTS); // Unchanged
    }

    #[test]
    fn test_invalid_nested_config_rejected() {
        let mut config = AppConfig::default();
        config.default_service_config.model_name = String::new();
        assert!(matches!(
            validate_app_config(&config),
            Err(ServiceConfigError::InvalidModelName(_))
        ));
    }
}
