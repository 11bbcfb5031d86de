//! Tooling & Integration Layer
//!
//! CLI commands, directory import/export and scripted edits on top of the
//! project API.

pub mod cli;
pub mod format;
pub mod import;
pub mod script;

pub use cli::{Cli, CliContext, Commands};
pub use import::{read_directory, write_directory, ImportOptions};
pub use script::{apply_script, ScriptOp};
