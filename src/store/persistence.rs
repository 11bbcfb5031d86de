//! Sled-backed entry and project store.
//!
//! Trees:
//! - `entries`: entry id -> bincode record
//! - `paths`: `project \0 path` -> entry id (uniqueness of path per project)
//! - `children`: `project \0 parent \0 id` -> () (roots use an empty parent)
//! - `projects`: project id -> bincode record

use super::project::{Project, ProjectStore};
use super::{ChangeSet, EntryStore, PersistedEntry};
use crate::error::StorageError;
use crate::types::{EntryId, ProjectId};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionResult,
};
use sled::Transactional;
use std::path::Path;

const SEP: u8 = 0;
const EMPTY: &[u8] = &[];

pub struct SledEntryStore {
    db: sled::Db,
    entries: sled::Tree,
    paths: sled::Tree,
    children: sled::Tree,
    projects: sled::Tree,
}

impl SledEntryStore {
    /// Open (or create) a store at `path`
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            entries: db.open_tree("entries")?,
            paths: db.open_tree("paths")?,
            children: db.open_tree("children")?,
            projects: db.open_tree("projects")?,
            db,
        })
    }

    /// In-memory store removed on drop
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Result<PersistedEntry, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn load_ids(&self, ids: impl Iterator<Item = Vec<u8>>) -> Result<Vec<PersistedEntry>, StorageError> {
        let mut out = Vec::new();
        for id in ids {
            match self.entries.get(&id)? {
                Some(bytes) => out.push(Self::decode(&bytes)?),
                None => tracing::warn!(
                    entry_id = %String::from_utf8_lossy(&id),
                    "Index references a missing entry"
                ),
            }
        }
        Ok(out)
    }
}

fn project_prefix(project: &ProjectId) -> Vec<u8> {
    let mut key = project.as_str().as_bytes().to_vec();
    key.push(SEP);
    key
}

fn path_key(project: &ProjectId, path: &str) -> Vec<u8> {
    let mut key = project_prefix(project);
    key.extend_from_slice(path.as_bytes());
    key
}

fn child_prefix(project: &ProjectId, parent: Option<&EntryId>) -> Vec<u8> {
    let mut key = project_prefix(project);
    if let Some(parent) = parent {
        key.extend_from_slice(parent.as_str().as_bytes());
    }
    key.push(SEP);
    key
}

fn child_key(entry: &PersistedEntry) -> Vec<u8> {
    let mut key = child_prefix(&entry.project_id, entry.parent_id.as_ref());
    key.extend_from_slice(entry.id.as_str().as_bytes());
    key
}

fn abort(err: StorageError) -> ConflictableTransactionError<StorageError> {
    ConflictableTransactionError::Abort(err)
}

fn finish_tx<T>(result: TransactionResult<T, StorageError>) -> Result<T, StorageError> {
    result.map_err(|e| match e {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => StorageError::Sled(err),
    })
}

impl EntryStore for SledEntryStore {
    fn next_id(&self) -> Result<EntryId, StorageError> {
        Ok(EntryId::from_counter(self.db.generate_id()?))
    }

    fn get(&self, id: &EntryId) -> Result<Option<PersistedEntry>, StorageError> {
        self.entries
            .get(id.as_str().as_bytes())?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    fn get_by_path(
        &self,
        project: &ProjectId,
        path: &str,
    ) -> Result<Option<PersistedEntry>, StorageError> {
        match self.paths.get(path_key(project, path))? {
            Some(id) => Ok(self.load_ids(std::iter::once(id.to_vec()))?.pop()),
            None => Ok(None),
        }
    }

    fn insert(&self, entry: &PersistedEntry) -> Result<(), StorageError> {
        let value = bincode::serialize(entry)?;
        let pkey = path_key(&entry.project_id, &entry.path);
        let ckey = child_key(entry);
        let id = entry.id.as_str().as_bytes();

        finish_tx((&self.entries, &self.paths, &self.children).transaction(
            |(entries, paths, children)| -> ConflictableTransactionResult<(), StorageError> {
                if paths.get(pkey.as_slice())?.is_some() {
                    return Err(abort(StorageError::Conflict {
                        project: entry.project_id.clone(),
                        path: entry.path.clone(),
                    }));
                }
                paths.insert(pkey.as_slice(), id)?;
                children.insert(ckey.as_slice(), EMPTY)?;
                entries.insert(id, value.as_slice())?;
                Ok(())
            },
        ))
    }

    fn list_project(&self, project: &ProjectId) -> Result<Vec<PersistedEntry>, StorageError> {
        let ids = self
            .paths
            .scan_prefix(project_prefix(project))
            .values()
            .collect::<Result<Vec<_>, _>>()?;
        self.load_ids(ids.into_iter().map(|id| id.to_vec()))
    }

    fn list_children(
        &self,
        project: &ProjectId,
        parent: Option<&EntryId>,
    ) -> Result<Vec<PersistedEntry>, StorageError> {
        let prefix = child_prefix(project, parent);
        let keys = self
            .children
            .scan_prefix(&prefix)
            .keys()
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = self.load_ids(keys.into_iter().map(|k| k[prefix.len()..].to_vec()))?;
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn delete_project_entries(&self, project: &ProjectId) -> Result<usize, StorageError> {
        let prefix = project_prefix(project);
        let path_rows = self
            .paths
            .scan_prefix(&prefix)
            .collect::<Result<Vec<_>, _>>()?;
        let child_keys = self
            .children
            .scan_prefix(&prefix)
            .keys()
            .collect::<Result<Vec<_>, _>>()?;

        finish_tx((&self.entries, &self.paths, &self.children).transaction(
            |(entries, paths, children)| -> ConflictableTransactionResult<(), StorageError> {
                for (pkey, id) in &path_rows {
                    paths.remove(&pkey[..])?;
                    entries.remove(&id[..])?;
                }
                for ckey in &child_keys {
                    children.remove(&ckey[..])?;
                }
                Ok(())
            },
        ))?;
        Ok(path_rows.len())
    }

    fn apply(&self, changes: &ChangeSet) -> Result<(), StorageError> {
        let writes = changes
            .updates
            .iter()
            .chain(changes.inserts.iter())
            .map(|entry| {
                Ok::<_, StorageError>((
                    entry,
                    bincode::serialize(entry)?,
                    path_key(&entry.project_id, &entry.path),
                    child_key(entry),
                ))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        let released: Vec<&EntryId> = changes
            .removes
            .iter()
            .chain(changes.updates.iter().map(|e| &e.id))
            .collect();

        finish_tx((&self.entries, &self.paths, &self.children).transaction(
            |(entries, paths, children)| -> ConflictableTransactionResult<(), StorageError> {
                for id in &released {
                    let Some(bytes) = entries.get(id.as_str().as_bytes())? else {
                        return Err(abort(StorageError::NotFound(format!("Entry {}", id))));
                    };
                    let old = Self::decode(&bytes).map_err(abort)?;
                    paths.remove(path_key(&old.project_id, &old.path).as_slice())?;
                    children.remove(child_key(&old).as_slice())?;
                }
                for id in &changes.removes {
                    entries.remove(id.as_str().as_bytes())?;
                }
                for (entry, value, pkey, ckey) in &writes {
                    if paths.get(pkey.as_slice())?.is_some() {
                        return Err(abort(StorageError::Conflict {
                            project: entry.project_id.clone(),
                            path: entry.path.clone(),
                        }));
                    }
                    let id = entry.id.as_str().as_bytes();
                    paths.insert(pkey.as_slice(), id)?;
                    children.insert(ckey.as_slice(), EMPTY)?;
                    entries.insert(id, value.as_slice())?;
                }
                Ok(())
            },
        ))
    }
}

impl ProjectStore for SledEntryStore {
    fn next_project_id(&self) -> Result<ProjectId, StorageError> {
        Ok(ProjectId::from_counter(self.db.generate_id()?))
    }

    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StorageError> {
        match self.projects.get(id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_project(&self, project: &Project) -> Result<(), StorageError> {
        let value = bincode::serialize(project)?;
        self.projects.insert(project.id.as_str().as_bytes(), value)?;
        Ok(())
    }

    fn delete_project(&self, id: &ProjectId) -> Result<bool, StorageError> {
        Ok(self.projects.remove(id.as_str().as_bytes())?.is_some())
    }

    fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let mut projects = Vec::new();
        for bytes in self.projects.iter().values() {
            projects.push(bincode::deserialize::<Project>(&bytes?)?);
        }
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }
}
