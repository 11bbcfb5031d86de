//! Entry record store
//!
//! Persisted form of a project's tree: one record per entry, linked to its
//! parent by id and carrying a redundant path for prefix queries.
//! `(project_id, path)` is unique and `(project_id, parent_id)` is indexed.

pub mod persistence;
pub mod project;

pub use persistence::SledEntryStore;
pub use project::{Project, ProjectStore};

use crate::error::StorageError;
use crate::types::{EntryId, EntryKind, ProjectId};
use serde::{Deserialize, Serialize};

/// PersistedEntry: stored record of a single file or folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEntry {
    pub id: EntryId,
    pub project_id: ProjectId,
    pub parent_id: Option<EntryId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
    /// Empty for folders
    pub content: String,
}

impl PersistedEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// Writes applied atomically by [`EntryStore::apply`]
///
/// Removals run first, so an update or insert may claim a path that a removed
/// or updated record released in the same batch.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub removes: Vec<EntryId>,
    /// Records replacing an existing record with the same id
    pub updates: Vec<PersistedEntry>,
    pub inserts: Vec<PersistedEntry>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.removes.is_empty() && self.updates.is_empty() && self.inserts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removes.len() + self.updates.len() + self.inserts.len()
    }
}

/// Entry store interface
pub trait EntryStore: Send + Sync {
    /// Fresh store-generated entry id
    fn next_id(&self) -> Result<EntryId, StorageError>;

    fn get(&self, id: &EntryId) -> Result<Option<PersistedEntry>, StorageError>;

    fn get_by_path(
        &self,
        project: &ProjectId,
        path: &str,
    ) -> Result<Option<PersistedEntry>, StorageError>;

    /// Insert a new record; fails with `Conflict` when the path is taken
    fn insert(&self, entry: &PersistedEntry) -> Result<(), StorageError>;

    /// All records of a project, sorted by path ascending
    fn list_project(&self, project: &ProjectId) -> Result<Vec<PersistedEntry>, StorageError>;

    /// Direct children of `parent` (project roots for `None`)
    fn list_children(
        &self,
        project: &ProjectId,
        parent: Option<&EntryId>,
    ) -> Result<Vec<PersistedEntry>, StorageError>;

    /// Remove every record of a project; returns the number removed
    fn delete_project_entries(&self, project: &ProjectId) -> Result<usize, StorageError>;

    /// Apply a batch in a single transaction
    fn apply(&self, changes: &ChangeSet) -> Result<(), StorageError>;
}
