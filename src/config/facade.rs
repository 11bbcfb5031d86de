//! ConfigLoader facade over the merge service.

use super::merge::service::MergeService;
use super::StudioConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the full layered configuration for `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<StudioConfig, ConfigError> {
        MergeService::load(workspace_root)
    }

    /// Load one explicit file (required) with the environment on top.
    pub fn load_from_file(path: &Path) -> Result<StudioConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    pub fn default() -> StudioConfig {
        StudioConfig::default()
    }
}
