//! XDG base directories for studiotree data and config.

use crate::error::ApiError;
use std::path::{Component, Path, PathBuf};

pub const APP_DIR: &str = "studiotree";

/// `$XDG_DATA_HOME`, else `$HOME/.local/share`
pub fn data_home() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("XDG_DATA_HOME") {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// `$XDG_CONFIG_HOME`, else `$HOME/.config`
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").map_err(|_| {
        ApiError::ConfigError("Could not determine XDG config home (HOME not set)".to_string())
    })?;
    Ok(PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/studiotree/config.toml`
pub fn global_config_file() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}

/// Per-workspace data directory.
///
/// The canonical workspace path is mirrored below the data home, so
/// `/home/me/site` maps to `$XDG_DATA_HOME/studiotree/home/me/site`.
pub fn workspace_data_dir(workspace_root: &Path) -> Result<PathBuf, ApiError> {
    let data_home = data_home().ok_or_else(|| {
        ApiError::ConfigError("Could not determine XDG data home (HOME not set)".to_string())
    })?;
    let canonical = dunce::canonicalize(workspace_root).map_err(|e| {
        ApiError::ConfigError(format!(
            "Failed to canonicalize workspace path {}: {}",
            workspace_root.display(),
            e
        ))
    })?;
    Ok(mirror_under(data_home.join(APP_DIR), &canonical))
}

/// Append the normal components of `path` to `base`
pub(crate) fn mirror_under(base: PathBuf, path: &Path) -> PathBuf {
    path.components().fold(base, |acc, component| match component {
        Component::Normal(name) => acc.join(name),
        _ => acc,
    })
}
