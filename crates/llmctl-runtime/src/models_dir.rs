//! Model files on disk.
//!
//! A model is any regular file with a `.gguf` or `.bin` extension directly
//! inside the models directory; its id is the file stem.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs;

/// File extensions recognised as model weights.
pub const MODEL_EXTENSIONS: [&str; 2] = ["gguf", "bin"];

/// A model file found by [`scan_models`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    pub id: String,
    pub path: PathBuf,
    /// Last modification time as unix seconds (0 if unknown).
    pub modified: u64,
}

#[derive(Debug, Error)]
pub enum ModelLookupError {
    #[error("Model '{name}' not found in {}. Available models: [{}]", dir.display(), available.join(", "))]
    NotFound {
        name: String,
        dir: PathBuf,
        available: Vec<String>,
    },

    #[error("Failed to read models directory {}: {reason}", dir.display())]
    Unreadable { dir: PathBuf, reason: String },
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MODEL_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

fn unix_seconds(time: SystemTime) -> u64 {
    let timestamp = DateTime::<Utc>::from(time).timestamp();
    u64::try_from(timestamp).unwrap_or(0)
}

/// List model files in `dir`, sorted by id.
pub async fn scan_models(dir: &Path) -> std::io::Result<Vec<ModelFile>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut models = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_model_file(&path) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let modified = metadata.modified().map(unix_seconds).unwrap_or(0);
        models.push(ModelFile { id, path, modified });
    }

    models.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(models)
}

/// Find the weights file for `name`.
///
/// An existing `explicit` path wins. Otherwise `<dir>/<name>.gguf`,
/// `<dir>/<name>.bin` and `<dir>/<name>` are tried in that order.
pub async fn resolve_model_file(
    dir: &Path,
    name: &str,
    explicit: Option<&Path>,
) -> Result<PathBuf, ModelLookupError> {
    if let Some(path) = explicit {
        if fs::try_exists(path).await.unwrap_or(false) {
            return Ok(path.to_path_buf());
        }
    }

    let candidates = [
        dir.join(format!("{name}.gguf")),
        dir.join(format!("{name}.bin")),
        dir.join(name),
    ];
    for candidate in candidates {
        if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Ok(candidate);
        }
    }

    let available = match scan_models(dir).await {
        Ok(models) => models.into_iter().map(|m| m.id).collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            return Err(ModelLookupError::Unreadable {
                dir: dir.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    Err(ModelLookupError::NotFound {
        name: name.to_string(),
        dir: dir.to_path_buf(),
        available,
    })
}
