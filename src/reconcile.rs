//! Make a project's persisted entries match a submitted flat list.
//!
//! [`Reconciler::replace`] is the destroy-then-rebuild baseline: wipe the
//! project, then recreate every record shallowest first. [`Reconciler::sync`]
//! reaches the same end state by diffing against the stored records and
//! applying inserts, updates and removals in one transaction, so the project
//! is never observed empty and unchanged paths keep their ids.

use crate::concurrency::ProjectLockManager;
use crate::error::{ApiError, StorageError};
use crate::flat::FlatRecord;
use crate::store::{ChangeSet, EntryStore, PersistedEntry};
use crate::tree::path;
use crate::tree::validation::name_key;
use crate::types::{EntryId, EntryKind, ProjectId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Which reconciliation algorithm a caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileStrategy {
    Replace,
    #[default]
    Sync,
}

/// Counts from a diff reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
}

pub struct Reconciler {
    store: Arc<dyn EntryStore>,
    locks: Arc<ProjectLockManager>,
}

/// Normalized record ready to persist
struct Desired<'a> {
    path: String,
    record: &'a FlatRecord,
}

impl Reconciler {
    pub fn new(store: Arc<dyn EntryStore>, locks: Arc<ProjectLockManager>) -> Self {
        Self { store, locks }
    }

    /// Run the chosen strategy
    pub fn reconcile(
        &self,
        strategy: ReconcileStrategy,
        project: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<Vec<PersistedEntry>, ApiError> {
        let lock = self.locks.get_lock(project);
        let _guard = lock.write();
        self.reconcile_locked(strategy, project, records)
    }

    /// [`Reconciler::reconcile`] for a caller already holding the project's write lock
    pub(crate) fn reconcile_locked(
        &self,
        strategy: ReconcileStrategy,
        project: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<Vec<PersistedEntry>, ApiError> {
        match strategy {
            ReconcileStrategy::Replace => self.replace_locked(project, records),
            ReconcileStrategy::Sync => self.sync_locked(project, records).map(|(entries, _)| entries),
        }
    }

    /// Delete every entry of `project`, then recreate `records` in depth order.
    ///
    /// An empty list leaves the project with no entries. Paths that collide
    /// (exactly or by case) fail with `Conflict` before anything is deleted.
    /// A store failure part way through leaves whatever was created before it.
    pub fn replace(
        &self,
        project: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<Vec<PersistedEntry>, ApiError> {
        let lock = self.locks.get_lock(project);
        let _guard = lock.write();
        self.replace_locked(project, records)
    }

    fn replace_locked(
        &self,
        project: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<Vec<PersistedEntry>, ApiError> {
        let desired = Self::ordered(project, records)?;
        let removed = self.store.delete_project_entries(project)?;
        let mut folder_ids: HashMap<String, EntryId> = HashMap::new();

        for item in &desired {
            let parent_id = path::parent_of(&item.path)
                .and_then(|p| folder_ids.get(p))
                .cloned();
            let entry = Self::persisted(self.store.next_id()?, project, parent_id, item);
            self.store.insert(&entry)?;
            if entry.is_folder() {
                folder_ids.insert(entry.path, entry.id);
            }
        }

        let entries = self.store.list_project(project)?;
        info!(
            project = %project,
            removed,
            created = entries.len(),
            "Replaced project entries"
        );
        Ok(entries)
    }

    /// Diff `records` against the store and apply the difference atomically.
    ///
    /// Input paths must be unique, ignoring case; a repeat fails with
    /// `Conflict` before anything is written.
    pub fn sync(
        &self,
        project: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<(Vec<PersistedEntry>, SyncStats), ApiError> {
        let lock = self.locks.get_lock(project);
        let _guard = lock.write();
        self.sync_locked(project, records)
    }

    pub(crate) fn sync_locked(
        &self,
        project: &ProjectId,
        records: &[FlatRecord],
    ) -> Result<(Vec<PersistedEntry>, SyncStats), ApiError> {
        let desired = Self::ordered(project, records)?;

        let mut existing: HashMap<String, PersistedEntry> = self
            .store
            .list_project(project)?
            .into_iter()
            .map(|e| (e.path.clone(), e))
            .collect();

        let mut changes = ChangeSet::default();
        let mut stats = SyncStats::default();
        let mut folder_ids: HashMap<String, EntryId> = HashMap::new();

        for item in &desired {
            let parent_id = path::parent_of(&item.path)
                .and_then(|p| folder_ids.get(p))
                .cloned();

            let entry = match existing.remove(&item.path) {
                Some(old) if old.kind == item.record.kind => {
                    let next = Self::persisted(old.id.clone(), project, parent_id, item);
                    if next == old {
                        stats.unchanged += 1;
                    } else {
                        changes.updates.push(next.clone());
                    }
                    next
                }
                other => {
                    if let Some(old) = other {
                        debug!(path = %old.path, "Entry changed kind; recreating");
                        changes.removes.push(old.id);
                    }
                    let next = Self::persisted(self.store.next_id()?, project, parent_id, item);
                    changes.inserts.push(next.clone());
                    next
                }
            };
            if entry.is_folder() {
                folder_ids.insert(entry.path, entry.id);
            }
        }
        changes.removes.extend(existing.into_values().map(|e| e.id));

        stats.inserted = changes.inserts.len();
        stats.updated = changes.updates.len();
        stats.removed = changes.removes.len();
        if !changes.is_empty() {
            self.store.apply(&changes)?;
        }

        let entries = self.store.list_project(project)?;
        info!(
            project = %project,
            inserted = stats.inserted,
            updated = stats.updated,
            removed = stats.removed,
            unchanged = stats.unchanged,
            "Synced project entries"
        );
        Ok((entries, stats))
    }

    /// Normalize paths, drop empty ones, and sort shallowest first (stable).
    ///
    /// Two paths with the same collision key would hydrate as one entry, so
    /// they are rejected here.
    fn ordered<'a>(project: &ProjectId, records: &'a [FlatRecord]) -> Result<Vec<Desired<'a>>, ApiError> {
        let mut out: Vec<Desired<'a>> = records
            .iter()
            .map(|record| Desired {
                path: path::normalize(&record.path),
                record,
            })
            .filter(|d| path::depth(&d.path) > 0)
            .collect();
        out.sort_by_key(|d| path::depth(&d.path));

        let mut unique = HashSet::new();
        if let Some(dup) = out.iter().find(|d| !unique.insert(name_key(&d.path))) {
            return Err(StorageError::Conflict {
                project: project.clone(),
                path: dup.path.clone(),
            }
            .into());
        }
        Ok(out)
    }

    fn persisted(
        id: EntryId,
        project: &ProjectId,
        parent_id: Option<EntryId>,
        desired: &Desired<'_>,
    ) -> PersistedEntry {
        PersistedEntry {
            id,
            project_id: project.clone(),
            parent_id,
            name: path::file_name(&desired.path).to_string(),
            kind: desired.record.kind,
            path: desired.path.clone(),
            content: match desired.record.kind {
                EntryKind::File => desired.record.content_or_empty().to_string(),
                EntryKind::Folder => String::new(),
            },
        }
    }
}
