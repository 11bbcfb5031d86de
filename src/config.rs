//! Configuration
//!
//! Layered with the `config` crate. Lowest to highest precedence:
//! built-in defaults, `$XDG_CONFIG_HOME/studiotree/config.toml`, the
//! workspace `studiotree.toml`, then `STUDIOTREE__*` environment variables
//! (`__` separates nested keys, e.g. `STUDIOTREE__HISTORY__CAPACITY=20`).

pub mod facade;
pub mod merge {
    pub mod policy;
    pub mod service;
}
pub mod paths {
    pub mod xdg_root;
}
pub mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}
pub mod workspace {
    pub mod storage_paths;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::StorageConfig;

use crate::error::ApiError;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::logging::LoggingConfig;
use crate::reconcile::ReconcileStrategy;
use crate::session::DEFAULT_DEBOUNCE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the per-workspace config file
pub const WORKSPACE_CONFIG_FILE: &str = "studiotree.toml";

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub autosave: AutosaveConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StudioConfig {
    /// Reject values that deserialize but cannot be used
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.autosave.debounce_ms == 0 {
            return Err(ApiError::ConfigError(
                "autosave.debounce_ms must be greater than zero".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            return Err(ApiError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                self.logging.format
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Undo steps kept per session; 0 disables undo
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Quiet period after the last change before a push
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub strategy: ReconcileStrategy,
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            debounce_ms: default_debounce_ms(),
            strategy: ReconcileStrategy::default(),
        }
    }
}
