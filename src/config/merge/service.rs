//! MergeService: stacks the sources and deserializes into StudioConfig.

use super::policy;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::StudioConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

pub struct MergeService;

impl MergeService {
    /// Precedence: defaults -> global file -> workspace file -> environment.
    pub fn load(workspace_root: &Path) -> Result<StudioConfig, ConfigError> {
        let builder = policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder)?;

        let config: StudioConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<StudioConfig, ConfigError> {
        let builder = policy::builder_with_defaults()?;
        let builder = builder.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder)?;

        let config: StudioConfig = builder.build()?.try_deserialize()?;
        debug!(file = %path.display(), "Loaded configuration file");
        Ok(config)
    }
}
