//! Inference service status and configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Model loaded when nothing else is configured.
pub const DEFAULT_MODEL_NAME: &str = "Llama-3.2-1B-Instruct-Q5_K_M";

/// Characters rejected in model identifiers.
const INVALID_MODEL_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Snapshot of the service as reported by the command interface.
///
/// This is the single source of truth for "is the service usable".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub is_running: bool,
    pub port: u16,
    pub model_name: String,
    pub base_url: String,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self {
            is_running: false,
            port: 0,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            base_url: "local".to_string(),
        }
    }
}

/// Configuration sent to the service on initialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub model_name: String,
    pub model_path: Option<PathBuf>,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: f32,
    /// Nucleus sampling threshold (0.0 - 1.0).
    pub top_p: f32,
    pub max_tokens: u32,
    pub ctx_size: u32,
    pub n_threads: Option<u32>,
    pub n_gpu_layers: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            model_path: None,
            temperature: 0.8,
            top_p: 0.9,
            max_tokens: 512,
            ctx_size: 4096,
            n_threads: None,
            n_gpu_layers: 0,
        }
    }
}

/// Service configuration validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceConfigError {
    #[error("Model name must be a valid identifier, got {0:?}")]
    InvalidModelName(String),

    #[error("Context size must be greater than 0")]
    InvalidContextSize,

    #[error("Temperature must be between 0 and 2, got {0}")]
    InvalidTemperature(f32),

    #[error("Top P must be between 0 and 1, got {0}")]
    InvalidTopP(f32),

    #[error("Max tokens must be greater than 0")]
    InvalidMaxTokens,

    #[error("Thread count must be greater than 0")]
    InvalidThreadCount,
}

/// Check whether a model identifier is usable.
///
/// Identifiers name a file inside the models directory, so path
/// separators and the `.`/`..` components are refused.
pub fn is_valid_model_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !name.contains(INVALID_MODEL_CHARS)
}

/// Validate service configuration values.
pub fn validate_service_config(config: &ServiceConfig) -> Result<(), ServiceConfigError> {
    if !is_valid_model_name(&config.model_name) {
        return Err(ServiceConfigError::InvalidModelName(
            config.model_name.clone(),
        ));
    }

    if config.ctx_size == 0 {
        return Err(ServiceConfigError::InvalidContextSize);
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ServiceConfigError::InvalidTemperature(config.temperature));
    }

    if !(0.0..=1.0).contains(&config.top_p) {
        return Err(ServiceConfigError::InvalidTopP(config.top_p));
    }

    if config.max_tokens == 0 {
        return Err(ServiceConfigError::InvalidMaxTokens);
    }

    if config.n_threads == Some(0) {
        return Err(ServiceConfigError::InvalidThreadCount);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_service_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_model_name_rules() {
        assert!(is_valid_model_name("deepseek-r1-distill-qwen-1.5b"));
        assert!(!is_valid_model_name("   "));
        assert!(!is_valid_model_name("bad|name"));
        assert!(!is_valid_model_name("C:model"));
    }

    #[test]
    fn test_model_name_cannot_leave_models_dir() {
        assert!(!is_valid_model_name("../secrets"));
        assert!(!is_valid_model_name("/etc/passwd"));
        assert!(!is_valid_model_name("nested/model"));
        assert!(!is_valid_model_name("..\\escape"));
        assert!(!is_valid_model_name(".."));
        assert!(!is_valid_model_name("."));
        assert!(is_valid_model_name("qwen2.5-0.5b"));
    }

    #[test]
    fn test_out_of_range_sampling() {
        let config = ServiceConfig {
            temperature: 2.5,
            ..Default::default()
        };
        assert_eq!(
            validate_service_config(&config),
            Err(ServiceConfigError::InvalidTemperature(2.5))
        );

        let config = ServiceConfig {
            top_p: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            validate_service_config(&config),
            Err(ServiceConfigError::InvalidTopP(_))
        ));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let config = ServiceConfig {
            ctx_size: 0,
            ..Default::default()
        };
        assert_eq!(
            validate_service_config(&config),
            Err(ServiceConfigError::InvalidContextSize)
        );

        let config = ServiceConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert_eq!(
            validate_service_config(&config),
            Err(ServiceConfigError::InvalidMaxTokens)
        );

        let config = ServiceConfig {
            n_threads: Some(0),
            ..Default::default()
        };
        assert_eq!(
            validate_service_config(&config),
            Err(ServiceConfigError::InvalidThreadCount)
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"model_name":"tiny","unknown":1}"#).unwrap();
        assert_eq!(config.model_name, "tiny");
        assert_eq!(config.ctx_size, 4096);
        assert!(config.n_threads.is_none());
    }
}
