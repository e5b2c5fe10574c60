//! Filesystem locations used by the runtime adapters.
//!
//! Resolution order for each location:
//! 1. Explicit value from the caller (e.g. `--models-dir`)
//! 2. Environment variable
//! 3. Default

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Environment variable overriding the models directory.
pub const MODELS_DIR_ENV: &str = "LLMCTL_MODELS_DIR";
/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "LLMCTL_CONFIG_DIR";
/// Environment variable overriding the llama-server binary.
pub const LLAMA_SERVER_ENV: &str = "LLMCTL_LLAMA_SERVER";

/// Models directory used when nothing else is configured, relative to the
/// working directory.
pub const DEFAULT_MODELS_DIR: &str = "models";

const APP_DIR_NAME: &str = "llmctl";
const CONFIG_FILE_NAME: &str = "config.json";

#[cfg(target_os = "windows")]
const LLAMA_SERVER_BINARY: &str = "llama-server.exe";
#[cfg(not(target_os = "windows"))]
const LLAMA_SERVER_BINARY: &str = "llama-server";

/// Errors raised while resolving paths.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Cannot determine configuration directory")]
    NoConfigDir,

    #[error("Path must not be empty")]
    EmptyPath,

    #[error("Cannot read current directory: {0}")]
    CurrentDirError(String),
}

/// How a path was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    Explicit,
    EnvVar,
    Default,
}

/// Expand `~` and make relative paths absolute against the working directory.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn resolve_models_dir_with(
    explicit: Option<&str>,
    env_value: Option<String>,
) -> Result<(PathBuf, PathSource), PathError> {
    if let Some(path) = explicit {
        return Ok((normalize_user_path(path)?, PathSource::Explicit));
    }
    if let Some(path) = env_value {
        return Ok((normalize_user_path(&path)?, PathSource::EnvVar));
    }
    Ok((normalize_user_path(DEFAULT_MODELS_DIR)?, PathSource::Default))
}

fn resolve_config_dir_with(env_value: Option<String>) -> Result<(PathBuf, PathSource), PathError> {
    if let Some(path) = env_value {
        return Ok((normalize_user_path(&path)?, PathSource::EnvVar));
    }
    let base = dirs::config_dir().ok_or(PathError::NoConfigDir)?;
    Ok((base.join(APP_DIR_NAME), PathSource::Default))
}

fn resolve_llama_server_with(env_value: Option<String>) -> PathBuf {
    // A bare binary name is looked up on PATH when spawned.
    env_value.map_or_else(|| PathBuf::from(LLAMA_SERVER_BINARY), PathBuf::from)
}

/// All runtime paths, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub models_dir: PathBuf,
    pub models_source: PathSource,
    pub config_path: PathBuf,
    pub llama_server: PathBuf,
}

impl RuntimePaths {
    /// Resolve against the current environment.
    pub fn resolve(models_dir: Option<&str>) -> Result<Self, PathError> {
        let (models_dir, models_source) =
            resolve_models_dir_with(models_dir, non_empty_env(MODELS_DIR_ENV))?;
        let (config_dir, _) = resolve_config_dir_with(non_empty_env(CONFIG_DIR_ENV))?;
        Ok(Self {
            models_dir,
            models_source,
            config_path: config_dir.join(CONFIG_FILE_NAME),
            llama_server: resolve_llama_server_with(non_empty_env(LLAMA_SERVER_ENV)),
        })
    }
}

impl std::fmt::Display for RuntimePaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "models_dir = {}", self.models_dir.display())?;
        writeln!(f, "models_source = {:?}", self.models_source)?;
        writeln!(f, "config_path = {}", self.config_path.display())?;
        write!(f, "llama_server = {}", self.llama_server.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_models_dir_wins() {
        let (path, source) =
            resolve_models_dir_with(Some("/data/models"), Some("/env/models".to_string()))
                .unwrap();
        assert_eq!(path, PathBuf::from("/data/models"));
        assert_eq!(source, PathSource::Explicit);
    }

    #[test]
    fn test_env_models_dir_before_default() {
        let (path, source) = resolve_models_dir_with(None, Some("/env/models".to_string())).unwrap();
        assert_eq!(path, PathBuf::from("/env/models"));
        assert_eq!(source, PathSource::EnvVar);
    }

    #[test]
    fn test_default_models_dir_is_relative_to_cwd() {
        let (path, source) = resolve_models_dir_with(None, None).unwrap();
        assert_eq!(source, PathSource::Default);
        assert!(path.is_absolute());
        assert!(path.ends_with(DEFAULT_MODELS_DIR));
    }

    #[test]
    fn test_empty_explicit_path_rejected() {
        assert!(matches!(
            resolve_models_dir_with(Some("   "), None),
            Err(PathError::EmptyPath)
        ));
    }

    #[test]
    fn test_tilde_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(normalize_user_path("~/models").unwrap(), home.join("models"));
            assert_eq!(normalize_user_path("~").unwrap(), home);
        }
    }

    #[test]
    fn test_config_dir_from_env() {
        let (dir, source) = resolve_config_dir_with(Some("/tmp/llmctl-conf".to_string())).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/llmctl-conf"));
        assert_eq!(source, PathSource::EnvVar);
    }

    #[test]
    fn test_llama_server_binary() {
        assert_eq!(
            resolve_llama_server_with(Some("/opt/llama/llama-server".to_string())),
            PathBuf::from("/opt/llama/llama-server")
        );
        assert_eq!(
            resolve_llama_server_with(None),
            PathBuf::from(LLAMA_SERVER_BINARY)
        );
    }
}
