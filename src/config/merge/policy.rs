//! Built-in defaults, the lowest layer of every load.

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::session::DEFAULT_DEBOUNCE;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("history.capacity", DEFAULT_HISTORY_CAPACITY as i64)?
        .set_default("autosave.enabled", true)?
        .set_default("autosave.debounce_ms", DEFAULT_DEBOUNCE.as_millis() as i64)?
        .set_default("autosave.strategy", "sync")?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")
}
