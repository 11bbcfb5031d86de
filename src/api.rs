//! Project API
//!
//! Entry point used by the transport layer and the CLI: project lifecycle,
//! single-entry edits against the store, and whole-tree reconciliation.

use crate::concurrency::ProjectLockManager;
use crate::error::{ApiError, TreeError};
use crate::flat::{hydrate_by_parent, FlatRecord};
use crate::reconcile::{ReconcileStrategy, Reconciler, SyncStats};
use crate::store::{ChangeSet, EntryStore, PersistedEntry, Project, ProjectStore, SledEntryStore};
use crate::template;
use crate::tree::validation::{name_key, validate_name};
use crate::tree::{path, Forest};
use crate::types::{EntryId, EntryKind, ProjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A project together with its persisted entries (sorted by path)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub project: Project,
    pub files: Vec<PersistedEntry>,
}

pub struct ProjectApi {
    entries: Arc<dyn EntryStore>,
    projects: Arc<dyn ProjectStore>,
    locks: Arc<ProjectLockManager>,
    reconciler: Reconciler,
}

impl ProjectApi {
    pub fn new(
        entries: Arc<dyn EntryStore>,
        projects: Arc<dyn ProjectStore>,
        locks: Arc<ProjectLockManager>,
    ) -> Self {
        let reconciler = Reconciler::new(entries.clone(), locks.clone());
        Self {
            entries,
            projects,
            locks,
            reconciler,
        }
    }

    /// API over a single sled store serving both entries and projects
    pub fn from_sled(store: Arc<SledEntryStore>) -> Self {
        Self::new(
            store.clone(),
            store,
            Arc::new(ProjectLockManager::new()),
        )
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Create a project, seeded with `files` or the default template
    pub fn create_project(
        &self,
        name: &str,
        files: Option<&[FlatRecord]>,
    ) -> Result<ProjectSnapshot, ApiError> {
        let name = Self::project_name(name)?;
        let project = Project::new(self.projects.next_project_id()?, name);
        self.projects.put_project(&project)?;

        let seeded = match files {
            Some(records) => self.reconciler.replace(&project.id, records),
            None => self.reconciler.replace(&project.id, &template::default_records()),
        };
        let seeded = match seeded {
            Ok(entries) => entries,
            Err(e) => {
                self.projects.delete_project(&project.id)?;
                self.locks.forget(&project.id);
                return Err(e);
            }
        };
        info!(project = %project.id, name = %project.name, files = seeded.len(), "Created project");
        Ok(ProjectSnapshot {
            project,
            files: seeded,
        })
    }

    pub fn get_project(&self, id: &ProjectId) -> Result<ProjectSnapshot, ApiError> {
        let project = self.require_project(id)?;
        let lock = self.locks.get_lock(id);
        let _guard = lock.read();
        let files = self.entries.list_project(id)?;
        Ok(ProjectSnapshot { project, files })
    }

    /// Rename a project and/or reconcile its files
    pub fn update_project(
        &self,
        id: &ProjectId,
        name: Option<&str>,
        files: Option<&[FlatRecord]>,
        strategy: ReconcileStrategy,
    ) -> Result<ProjectSnapshot, ApiError> {
        let mut project = self.require_project(id)?;
        if let Some(name) = name {
            project.name = Self::project_name(name)?;
        }
        let lock = self.locks.get_lock(id);
        let _guard = lock.write();
        let files = match files {
            Some(records) => self.reconciler.reconcile_locked(strategy, id, records)?,
            None => self.entries.list_project(id)?,
        };
        project.touch();
        self.projects.put_project(&project)?;
        Ok(ProjectSnapshot { project, files })
    }

    pub fn delete_project(&self, id: &ProjectId) -> Result<(), ApiError> {
        self.require_project(id)?;
        {
            let lock = self.locks.get_lock(id);
            let _guard = lock.write();
            let removed = self.entries.delete_project_entries(id)?;
            self.projects.delete_project(id)?;
            info!(project = %id, removed, "Deleted project");
        }
        self.locks.forget(id);
        Ok(())
    }

    /// All projects, most recently updated first
    pub fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        Ok(self.projects.list_projects()?)
    }

    /// Full replace of a project's files
    pub fn replace_files(
        &self,
        id: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<Vec<PersistedEntry>, ApiError> {
        self.update_project(id, None, Some(records), ReconcileStrategy::Replace)
            .map(|snapshot| snapshot.files)
    }

    /// Transactional diff of a project's files
    pub fn sync_files(
        &self,
        id: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<Vec<PersistedEntry>, ApiError> {
        self.update_project(id, None, Some(records), ReconcileStrategy::Sync)
            .map(|snapshot| snapshot.files)
    }

    /// Diff-sync a project's files and report what changed
    pub fn sync_with_stats(
        &self,
        id: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<(ProjectSnapshot, SyncStats), ApiError> {
        let mut project = self.require_project(id)?;
        let lock = self.locks.get_lock(id);
        let _guard = lock.write();
        let (files, stats) = self.reconciler.sync_locked(id, records)?;
        project.touch();
        self.projects.put_project(&project)?;
        Ok((ProjectSnapshot { project, files }, stats))
    }

    /// Hydrate the persisted tree, keeping store ids
    pub fn load_forest(&self, id: &ProjectId) -> Result<Forest, ApiError> {
        let snapshot = self.get_project(id)?;
        Ok(hydrate_by_parent(&snapshot.files))
    }

    /// Create one entry under `parent` (project root for `None`)
    pub fn create_entry(
        &self,
        project_id: &ProjectId,
        parent: Option<&EntryId>,
        name: &str,
        kind: EntryKind,
        content: Option<&str>,
    ) -> Result<PersistedEntry, ApiError> {
        self.require_project(project_id)?;
        validate_name(name)?;

        let lock = self.locks.get_lock(project_id);
        let _guard = lock.write();

        let parent_path = match parent {
            None => String::new(),
            Some(parent_id) => {
                let parent = self
                    .entries
                    .get(parent_id)?
                    .filter(|p| &p.project_id == project_id)
                    .ok_or_else(|| TreeError::NotFound(format!("Parent {} not found", parent_id)))?;
                if !parent.is_folder() {
                    return Err(TreeError::Validation(
                        "Cannot create children under a file".to_string(),
                    )
                    .into());
                }
                parent.path
            }
        };
        self.ensure_name_free(project_id, parent, name, None)?;

        let entry = PersistedEntry {
            id: self.entries.next_id()?,
            project_id: project_id.clone(),
            parent_id: parent.cloned(),
            name: name.to_string(),
            kind,
            path: path::join(&parent_path, name),
            content: match kind {
                EntryKind::File => content.unwrap_or_default().to_string(),
                EntryKind::Folder => String::new(),
            },
        };
        self.entries.insert(&entry)?;
        self.touch(project_id)?;
        info!(project = %project_id, entry_id = %entry.id, path = %entry.path, "Created entry");
        Ok(entry)
    }

    /// Rename and/or rewrite the content of one entry.
    ///
    /// The new path is built from the stored parent's path. A folder rename
    /// rewrites the path of every descendant reachable through parent links
    /// in the same batch.
    pub fn update_entry(
        &self,
        id: &EntryId,
        name: Option<&str>,
        content: Option<&str>,
    ) -> Result<PersistedEntry, ApiError> {
        let current = self.require_entry(id)?;
        let project_id = current.project_id.clone();
        let lock = self.locks.get_lock(&project_id);
        let _guard = lock.write();

        let mut updated = current.clone();
        let mut changes = ChangeSet::default();

        if let Some(content) = content {
            if current.is_folder() {
                return Err(TreeError::Validation("Folders do not support content".to_string()).into());
            }
            updated.content = content.to_string();
        }

        if let Some(name) = name.filter(|n| *n != current.name) {
            validate_name(name)?;
            self.ensure_name_free(&project_id, current.parent_id.as_ref(), name, Some(id))?;
            let parent_path = match current.parent_id.as_ref() {
                Some(parent_id) => self.require_entry(parent_id)?.path,
                None => String::new(),
            };
            let new_path = path::join(&parent_path, name);
            updated.name = name.to_string();
            updated.path = new_path.clone();

            if current.is_folder() {
                let mut by_parent: HashMap<EntryId, Vec<PersistedEntry>> = HashMap::new();
                for entry in self.entries.list_project(&project_id)? {
                    if let Some(parent_id) = entry.parent_id.clone() {
                        by_parent.entry(parent_id).or_default().push(entry);
                    }
                }
                // descendant paths follow parent links, not the old path prefix
                let mut stack = vec![(current.id.clone(), new_path.clone())];
                while let Some((parent_id, parent_path)) = stack.pop() {
                    for mut child in by_parent.remove(&parent_id).unwrap_or_default() {
                        let child_path = path::join(&parent_path, &child.name);
                        if child.is_folder() {
                            stack.push((child.id.clone(), child_path.clone()));
                        }
                        if child.path != child_path {
                            child.path = child_path;
                            changes.updates.push(child);
                        }
                    }
                }
            }
        }

        if updated == current {
            return Ok(current);
        }
        changes.updates.push(updated.clone());
        let cascaded = changes.updates.len() - 1;
        self.entries.apply(&changes)?;
        self.touch(&project_id)?;
        info!(entry_id = %id, path = %updated.path, cascaded, "Updated entry");
        Ok(updated)
    }

    /// Delete an entry and every entry stored under its path; returns the count removed
    pub fn delete_entry(&self, id: &EntryId) -> Result<usize, ApiError> {
        let target = self.require_entry(id)?;
        let lock = self.locks.get_lock(&target.project_id);
        let _guard = lock.write();

        let removes: Vec<EntryId> = self
            .entries
            .list_project(&target.project_id)?
            .into_iter()
            .filter(|e| path::is_within(&e.path, &target.path))
            .map(|e| e.id)
            .collect();
        let removed = removes.len();
        self.entries.apply(&ChangeSet {
            removes,
            ..ChangeSet::default()
        })?;
        self.touch(&target.project_id)?;
        info!(entry_id = %id, path = %target.path, removed, "Deleted entry");
        Ok(removed)
    }

    fn require_project(&self, id: &ProjectId) -> Result<Project, ApiError> {
        self.projects
            .get_project(id)?
            .ok_or_else(|| ApiError::ProjectNotFound(id.clone()))
    }

    fn require_entry(&self, id: &EntryId) -> Result<PersistedEntry, ApiError> {
        self.entries
            .get(id)?
            .ok_or_else(|| TreeError::NotFound(format!("Entry {} not found", id)).into())
    }

    fn ensure_name_free(
        &self,
        project: &ProjectId,
        parent: Option<&EntryId>,
        name: &str,
        except: Option<&EntryId>,
    ) -> Result<(), ApiError> {
        let key = name_key(name);
        let taken = self
            .entries
            .list_children(project, parent)?
            .iter()
            .filter(|e| Some(&e.id) != except)
            .any(|e| name_key(&e.name) == key);
        if taken {
            return Err(TreeError::Validation(format!(
                "An entry named '{}' already exists here",
                name
            ))
            .into());
        }
        Ok(())
    }

    fn touch(&self, id: &ProjectId) -> Result<(), ApiError> {
        let mut project = self.require_project(id)?;
        project.touch();
        self.projects.put_project(&project)?;
        Ok(())
    }

    fn project_name(name: &str) -> Result<String, ApiError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TreeError::Validation("Project name cannot be empty".to_string()).into());
        }
        Ok(trimmed.to_string())
    }
}
