//! Environment overlay: STUDIOTREE__SECTION__KEY

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

pub const ENV_PREFIX: &str = "STUDIOTREE";

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    ))
}
