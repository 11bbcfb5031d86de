//! CLI Tooling
//!
//! Command-line front end over [`ProjectApi`]. Every command runs against
//! the workspace's sled store and returns its output as a string; the binary
//! only prints it.

use crate::api::{ProjectApi, ProjectSnapshot};
use crate::config::{ConfigLoader, StudioConfig};
use crate::error::{ApiError, StorageError, TreeError};
use crate::flat::{flatten, FlatRecord};
use crate::reconcile::ReconcileStrategy;
use crate::session::{Autosave, StoreSink, WorkspaceSession};
use crate::store::{PersistedEntry, SledEntryStore};
use crate::tooling::format::{format_project_table, format_section_heading, format_sync_stats, format_tree};
use crate::tooling::import::{read_directory, write_directory, ImportOptions};
use crate::tooling::script::{apply_script, ScriptOp};
use crate::tree::path;
use crate::tree::validation::names_collide;
use crate::types::{EntryId, EntryKind, ProjectId};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// studiotree - project trees kept path-consistent between editor and store
#[derive(Parser)]
#[command(name = "studiotree")]
#[command(about = "Edit, import and reconcile hierarchical project trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides layered config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log at debug level to stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Single-entry edits addressed by path
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Import a directory into a new or existing project
    Import {
        /// Directory to read
        dir: PathBuf,
        /// Existing project to reconcile into
        #[arg(long, conflicts_with = "name")]
        project: Option<String>,
        /// Name for a new project (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Include dot files and dot directories
        #[arg(long)]
        include_hidden: bool,
    },
    /// Print flat records as JSON, or write the files to a directory
    Export {
        project: String,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Reconcile a project with a JSON file of flat records
    Apply {
        project: String,
        file: PathBuf,
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },
    /// Replay a JSON script of tree operations and autosave the result
    Edit { project: String, script: PathBuf },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project from the default template or a records file
    Create {
        name: String,
        /// JSON file of flat records to seed from
        #[arg(long, conflicts_with = "empty")]
        from: Option<PathBuf>,
        /// Start with no files
        #[arg(long)]
        empty: bool,
    },
    /// List projects, most recently updated first
    List {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show a project's tree
    Show {
        id: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    Rename { id: String, name: String },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Create a file or folder; missing parent folders are created
    Add {
        project: String,
        path: String,
        #[arg(long)]
        folder: bool,
        #[arg(long)]
        content: Option<String>,
    },
    /// Rename an entry; descendants follow
    Rename { project: String, path: String, name: String },
    /// Delete an entry and everything under it
    Rm { project: String, path: String },
    /// Replace a file's content
    Write { project: String, path: String, content: String },
    /// Move an entry into another folder (root when --to is omitted)
    Mv {
        project: String,
        path: String,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Duplicate an entry next to itself
    Cp { project: String, path: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Sync,
    Replace,
}

impl From<StrategyArg> for ReconcileStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sync => ReconcileStrategy::Sync,
            StrategyArg::Replace => ReconcileStrategy::Replace,
        }
    }
}

/// CLI context for one workspace
pub struct CliContext {
    api: Arc<ProjectApi>,
    store: Arc<SledEntryStore>,
    config: StudioConfig,
    store_path: PathBuf,
}

impl CliContext {
    /// Load config, then open (or create) the workspace store
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.validate()?;

        let store_path = config.storage.resolve_store_path(&workspace_root)?;
        std::fs::create_dir_all(&store_path).map_err(StorageError::IoError)?;
        let store = Arc::new(SledEntryStore::new(&store_path)?);
        Ok(Self::with_store(store, config, store_path))
    }

    /// Context over an already-open store
    pub fn with_store(store: Arc<SledEntryStore>, config: StudioConfig, store_path: PathBuf) -> Self {
        let api = Arc::new(ProjectApi::from_sled(store.clone()));
        Self {
            api,
            store,
            config,
            store_path,
        }
    }

    pub fn api(&self) -> &ProjectApi {
        &self.api
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Execute a command and flush the store
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let output = match command {
            Commands::Project { command } => self.handle_project_command(command),
            Commands::Entry { command } => self.handle_entry_command(command),
            Commands::Import {
                dir,
                project,
                name,
                strategy,
                include_hidden,
            } => self.handle_import(dir, project.as_deref(), name.as_deref(), *strategy, *include_hidden),
            Commands::Export { project, dir } => self.handle_export(&ProjectId::from(project.as_str()), dir.as_deref()),
            Commands::Apply {
                project,
                file,
                strategy,
            } => self.handle_apply(&ProjectId::from(project.as_str()), file, *strategy),
            Commands::Edit { project, script } => self.handle_edit(&ProjectId::from(project.as_str()), script),
        }?;
        self.store.flush()?;
        Ok(output)
    }

    fn strategy(&self, arg: Option<StrategyArg>) -> ReconcileStrategy {
        arg.map(Into::into).unwrap_or(self.config.autosave.strategy)
    }

    fn handle_project_command(&self, command: &ProjectCommands) -> Result<String, ApiError> {
        match command {
            ProjectCommands::Create { name, from, empty } => {
                let records = match (from, empty) {
                    (Some(file), _) => Some(read_records(file)?),
                    (None, true) => Some(Vec::new()),
                    (None, false) => None,
                };
                let snapshot = self.api.create_project(name, records.as_deref())?;
                Ok(format!(
                    "Created project {} ({}) with {} entries",
                    snapshot.project.id,
                    snapshot.project.name,
                    snapshot.files.len()
                ))
            }
            ProjectCommands::List { format } => {
                let projects = self.api.list_projects()?;
                if format == "json" {
                    return to_json(&projects);
                }
                Ok(format_project_table(&projects))
            }
            ProjectCommands::Show { id, format } => {
                let snapshot = self.api.get_project(&ProjectId::from(id.as_str()))?;
                if format == "json" {
                    return to_json(&snapshot);
                }
                Ok(format_snapshot(&snapshot))
            }
            ProjectCommands::Rename { id, name } => {
                let snapshot = self.api.update_project(
                    &ProjectId::from(id.as_str()),
                    Some(name),
                    None,
                    ReconcileStrategy::default(),
                )?;
                Ok(format!("Renamed project {} to {}", snapshot.project.id, snapshot.project.name))
            }
            ProjectCommands::Delete { id } => {
                let id = ProjectId::from(id.as_str());
                self.api.delete_project(&id)?;
                Ok(format!("Deleted project {}", id))
            }
        }
    }

    fn handle_entry_command(&self, command: &EntryCommands) -> Result<String, ApiError> {
        match command {
            EntryCommands::Add {
                project,
                path: raw,
                folder,
                content,
            } => {
                let project = ProjectId::from(project.as_str());
                let kind = if *folder { EntryKind::Folder } else { EntryKind::File };
                let entry = self.add_entry(&project, raw, kind, content.as_deref())?;
                Ok(format!("Created {} {}", entry.kind, entry.path))
            }
            EntryCommands::Rename {
                project,
                path: raw,
                name,
            } => {
                let target = self.entry_at(&ProjectId::from(project.as_str()), raw)?;
                let updated = self.api.update_entry(&target.id, Some(name), None)?;
                Ok(format!("Renamed {} to {}", target.path, updated.path))
            }
            EntryCommands::Rm { project, path: raw } => {
                let target = self.entry_at(&ProjectId::from(project.as_str()), raw)?;
                let removed = self.api.delete_entry(&target.id)?;
                Ok(format!("Deleted {} ({} entries)", target.path, removed))
            }
            EntryCommands::Write {
                project,
                path: raw,
                content,
            } => {
                let target = self.entry_at(&ProjectId::from(project.as_str()), raw)?;
                self.api.update_entry(&target.id, None, Some(content))?;
                Ok(format!("Wrote {} bytes to {}", content.len(), target.path))
            }
            EntryCommands::Mv {
                project,
                path: raw,
                to,
                index,
            } => {
                let op = ScriptOp::Move {
                    path: raw.clone(),
                    to: to.clone(),
                    index: *index,
                };
                let project = ProjectId::from(project.as_str());
                let snapshot = self.edit_and_save(&project, &[op])?;
                Ok(format!("Moved {} ({} entries)", raw, snapshot.files.len()))
            }
            EntryCommands::Cp { project, path: raw } => {
                let op = ScriptOp::Duplicate { path: raw.clone() };
                let project = ProjectId::from(project.as_str());
                let snapshot = self.edit_and_save(&project, &[op])?;
                Ok(format!("Duplicated {} ({} entries)", raw, snapshot.files.len()))
            }
        }
    }

    /// Create an entry, first creating any missing parent folders
    fn add_entry(
        &self,
        project: &ProjectId,
        raw_path: &str,
        kind: EntryKind,
        content: Option<&str>,
    ) -> Result<PersistedEntry, ApiError> {
        let normalized = path::normalize(raw_path);
        let segments: Vec<&str> = path::segments(&normalized).collect();
        let Some((name, folders)) = segments.split_last() else {
            return Err(TreeError::Validation(format!("'{}' is not an entry path", raw_path)).into());
        };

        let files = self.api.get_project(project)?.files;
        let mut parent: Option<EntryId> = None;
        for folder in folders {
            let existing = files
                .iter()
                .find(|e| e.parent_id == parent && names_collide(&e.name, folder));
            parent = Some(match existing {
                Some(entry) if entry.is_folder() => entry.id.clone(),
                Some(entry) => {
                    return Err(TreeError::Validation(format!("'{}' is a file", entry.path)).into());
                }
                None => self.api.create_entry(project, parent.as_ref(), folder, EntryKind::Folder, None)?.id,
            });
        }
        self.api.create_entry(project, parent.as_ref(), name, kind, content)
    }

    fn entry_at(&self, project: &ProjectId, raw_path: &str) -> Result<PersistedEntry, ApiError> {
        let wanted = path::normalize(raw_path);
        self.api
            .get_project(project)?
            .files
            .into_iter()
            .find(|e| e.path == wanted)
            .ok_or_else(|| TreeError::NotFound(format!("No entry at '{}'", raw_path)).into())
    }

    /// Apply ops to the stored tree in memory, then reconcile the result
    fn edit_and_save(&self, project: &ProjectId, ops: &[ScriptOp]) -> Result<ProjectSnapshot, ApiError> {
        let mut session = WorkspaceSession::with_capacity(self.api.load_forest(project)?, self.config.history.capacity);
        apply_script(&mut session, ops)?;
        self.api.update_project(
            project,
            None,
            Some(&session.records()),
            self.config.autosave.strategy,
        )
    }

    fn handle_import(
        &self,
        dir: &Path,
        project: Option<&str>,
        name: Option<&str>,
        strategy: Option<StrategyArg>,
        include_hidden: bool,
    ) -> Result<String, ApiError> {
        let options = ImportOptions {
            include_hidden,
            ..ImportOptions::default()
        };
        let records = read_directory(dir, &options)?;

        match project {
            Some(id) => {
                let id = ProjectId::from(id);
                let snapshot = self.api.update_project(&id, None, Some(&records), self.strategy(strategy))?;
                Ok(format!(
                    "Imported {} into {} ({} entries)",
                    dir.display(),
                    id,
                    snapshot.files.len()
                ))
            }
            None => {
                let name = match name {
                    Some(n) => n.to_string(),
                    None => dunce::canonicalize(dir)
                        .ok()
                        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                        .unwrap_or_else(|| "Imported project".to_string()),
                };
                let snapshot = self.api.create_project(&name, Some(&records))?;
                info!(project = %snapshot.project.id, dir = %dir.display(), "Imported directory");
                Ok(format!(
                    "Created project {} ({}) with {} entries",
                    snapshot.project.id,
                    snapshot.project.name,
                    snapshot.files.len()
                ))
            }
        }
    }

    fn handle_export(&self, project: &ProjectId, dir: Option<&Path>) -> Result<String, ApiError> {
        let records = flatten(&self.api.load_forest(project)?);
        match dir {
            Some(dir) => {
                let written = write_directory(dir, &records)?;
                Ok(format!("Wrote {} files to {}", written, dir.display()))
            }
            None => to_json(&records),
        }
    }

    fn handle_apply(
        &self,
        project: &ProjectId,
        file: &Path,
        strategy: Option<StrategyArg>,
    ) -> Result<String, ApiError> {
        let records = read_records(file)?;
        match self.strategy(strategy) {
            ReconcileStrategy::Sync => {
                let (snapshot, stats) = self.api.sync_with_stats(project, &records)?;
                Ok(format!(
                    "Synced {} entries\n{}",
                    snapshot.files.len(),
                    format_sync_stats(&stats)
                ))
            }
            ReconcileStrategy::Replace => {
                let entries = self.api.replace_files(project, &records)?;
                Ok(format!("Replaced with {} entries", entries.len()))
            }
        }
    }

    /// Replay a script in a session with autosave attached.
    ///
    /// Nothing is saved when a step fails.
    fn handle_edit(&self, project: &ProjectId, script: &Path) -> Result<String, ApiError> {
        let text = std::fs::read_to_string(script).map_err(StorageError::IoError)?;
        let ops: Vec<ScriptOp> = serde_json::from_str(&text)
            .map_err(|e| StorageError::InvalidInput(format!("Invalid script {}: {}", script.display(), e)))?;
        let forest = self.api.load_forest(project)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StorageError::IoError)?;

        let autosave = &self.config.autosave;
        let applied = runtime.block_on(async {
            let mut session = WorkspaceSession::with_capacity(forest.clone(), self.config.history.capacity);
            if autosave.enabled {
                let sink = Arc::new(StoreSink::new(self.api.clone(), project.clone(), autosave.strategy));
                session.attach_autosave(Autosave::spawn(sink, autosave.debounce(), forest));
            }

            // Dropping the session on error aborts autosave before any push
            let applied = apply_script(&mut session, &ops)?;
            if !autosave.enabled {
                self.api
                    .update_project(project, None, Some(&session.records()), autosave.strategy)?;
            }
            session.close().await?;
            Ok::<_, ApiError>(applied)
        })?;

        let snapshot = self.api.get_project(project)?;
        Ok(format!(
            "Applied {} operations; {} now has {} entries",
            applied,
            project,
            snapshot.files.len()
        ))
    }
}

fn read_records(file: &Path) -> Result<Vec<FlatRecord>, ApiError> {
    let text = std::fs::read_to_string(file).map_err(StorageError::IoError)?;
    serde_json::from_str(&text)
        .map_err(|e| StorageError::InvalidInput(format!("Invalid records file {}: {}", file.display(), e)).into())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::InvalidInput(format!("Failed to encode JSON: {}", e)).into())
}

fn format_snapshot(snapshot: &ProjectSnapshot) -> String {
    let forest = crate::flat::hydrate_by_parent(&snapshot.files);
    let files = snapshot.files.iter().filter(|e| e.kind == EntryKind::File).count();
    format!(
        "{}\n  ID: {}\n  Entries: {} ({} files)\n\n{}",
        format_section_heading(&snapshot.project.name),
        snapshot.project.id,
        snapshot.files.len(),
        files,
        format_tree(&forest, None)
    )
}
