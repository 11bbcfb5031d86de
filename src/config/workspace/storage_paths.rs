//! StorageConfig: where the sled store lives.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store directory, relative to the workspace root when not absolute.
    /// Unset means the workspace's XDG data directory.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_store_path(&self, workspace_root: &Path) -> Result<PathBuf, ApiError> {
        match &self.store_path {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(workspace_root.join(path)),
            None => Ok(xdg::workspace_data_dir(workspace_root)?.join("store")),
        }
    }
}
