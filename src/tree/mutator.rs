//! Structural edits over a [`Forest`].
//!
//! Every operation borrows the current snapshot and returns the next one.
//! Failures leave the input untouched, and operations that change nothing
//! hand back a clone of the input so `Forest::ptr_eq` identifies the no-op.

use super::entry::Entry;
use super::forest::Forest;
use super::path;
use super::validation::{duplicate_name, names_collide, unique_name, validate_name, MAX_DUPLICATE_ATTEMPTS};
use crate::error::TreeError;
use crate::types::{EntryId, EntryKind};
use tracing::debug;

/// Direction for [`Forest::move_node_within_siblings`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Forest {
    /// Create a file under `parent` (root when `None`)
    pub fn create_file(
        &self,
        parent: Option<&EntryId>,
        name: &str,
        content: impl Into<String>,
    ) -> Result<(Forest, EntryId), TreeError> {
        self.create_entry(parent, name, EntryKind::File, content.into())
    }

    /// Create an empty folder under `parent` (root when `None`)
    pub fn create_folder(
        &self,
        parent: Option<&EntryId>,
        name: &str,
    ) -> Result<(Forest, EntryId), TreeError> {
        self.create_entry(parent, name, EntryKind::Folder, String::new())
    }

    fn create_entry(
        &self,
        parent: Option<&EntryId>,
        name: &str,
        kind: EntryKind,
        content: String,
    ) -> Result<(Forest, EntryId), TreeError> {
        validate_name(name)?;
        let parent_path = self.folder_path(parent)?;
        if self.name_taken(parent, name, None) {
            return Err(TreeError::Validation(format!(
                "An entry named '{}' already exists here",
                name
            )));
        }

        let id = EntryId::generate();
        let entry_path = path::join(&parent_path, name);
        let entry = match kind {
            EntryKind::File => {
                Entry::new_file(id.clone(), name.to_string(), entry_path.clone(), None, content)
            }
            EntryKind::Folder => Entry::new_folder(id.clone(), name.to_string(), entry_path.clone(), None),
        };

        let mut draft = self.draft();
        draft.insert(entry);
        draft.attach(&id, parent, None)?;
        debug!(entry_id = %id, path = %entry_path, kind = %kind, "Created entry");
        Ok((draft.finish(), id))
    }

    /// Rename an entry and rewrite the paths of its whole subtree
    pub fn rename_node(&self, id: &EntryId, new_name: &str) -> Result<Forest, TreeError> {
        let entry = self.require(id)?;
        if entry.name == new_name {
            return Ok(self.clone());
        }
        validate_name(new_name)?;
        if self.name_taken(entry.parent.as_ref(), new_name, Some(id)) {
            return Err(TreeError::Validation(format!(
                "An entry named '{}' already exists here",
                new_name
            )));
        }

        let old_path = entry.path.clone();
        let new_path = path::join(path::parent_of(&old_path).unwrap_or(""), new_name);

        let mut draft = self.draft();
        if let Some(e) = draft.entry_mut(id) {
            e.name = new_name.to_string();
        }
        draft.rebase_subtree(id, new_path.clone());
        debug!(entry_id = %id, from = %old_path, to = %new_path, "Renamed entry");
        Ok(draft.finish())
    }

    /// Move an entry into `dest` (root when `None`) at `index`.
    ///
    /// Moving an entry onto itself or into its own subtree returns the input
    /// unchanged. A name clash in the destination gets a ` (n)` suffix.
    pub fn move_node_to_folder(
        &self,
        id: &EntryId,
        dest: Option<&EntryId>,
        index: Option<usize>,
    ) -> Result<Forest, TreeError> {
        let entry = self.require(id)?;
        if let Some(dest_id) = dest {
            if dest_id == id || self.is_descendant(id, dest_id) {
                debug!(entry_id = %id, dest = %dest_id, "Ignoring move into own subtree");
                return Ok(self.clone());
            }
        }
        if let Some(dest_entry) = dest.and_then(|d| self.get(d)) {
            if dest_entry.is_file() {
                return Err(TreeError::Validation(format!(
                    "Cannot move into file '{}'",
                    dest_entry.path
                )));
            }
        }
        let dest_path = self.folder_path(dest)?;

        let siblings = self
            .children_of(dest)
            .iter()
            .filter(|c| *c != id)
            .filter_map(|c| self.get(c))
            .map(|e| e.name.as_str());
        let name = unique_name(siblings, &entry.name, entry.is_file());
        let new_path = path::join(&dest_path, &name);

        let mut draft = self.draft();
        draft.detach(id);
        if name != entry.name {
            if let Some(e) = draft.entry_mut(id) {
                e.name = name;
            }
        }
        draft.attach(id, dest, index)?;
        draft.rebase_subtree(id, new_path.clone());
        debug!(entry_id = %id, from = %entry.path, to = %new_path, "Moved entry");
        Ok(draft.finish())
    }

    /// Swap an entry with its neighbour; no-op at either end of the list
    pub fn move_node_within_siblings(
        &self,
        id: &EntryId,
        direction: Direction,
    ) -> Result<Forest, TreeError> {
        let entry = self.require(id)?;
        let parent = entry.parent.as_ref();
        let siblings = self.children_of(parent);
        let Some(pos) = siblings.iter().position(|c| c == id) else {
            return Ok(self.clone());
        };
        let target = match direction {
            Direction::Up if pos > 0 => pos - 1,
            Direction::Down if pos + 1 < siblings.len() => pos + 1,
            _ => return Ok(self.clone()),
        };

        let mut draft = self.draft();
        draft.swap_siblings(parent, pos, target);
        Ok(draft.finish())
    }

    /// Move an entry one level up, appending it to its grandparent
    pub fn move_node_to_parent_folder(&self, id: &EntryId) -> Result<Forest, TreeError> {
        let entry = self.require(id)?;
        let Some(parent) = entry.parent.as_ref() else {
            return Ok(self.clone());
        };
        let grandparent = self.parent_of(parent).cloned();
        self.move_node_to_folder(id, grandparent.as_ref(), None)
    }

    /// Remove an entry and everything beneath it
    pub fn delete_node(&self, id: &EntryId) -> Result<Forest, TreeError> {
        let entry = self.require(id)?;
        let mut draft = self.draft();
        draft.detach(id);
        let removed = draft.remove_subtree(id);
        debug!(entry_id = %id, path = %entry.path, removed, "Deleted entry");
        Ok(draft.finish())
    }

    /// Copy an entry next to itself under a ` copy` name.
    ///
    /// Files keep their content; folders are duplicated as an empty shell.
    pub fn duplicate_node(&self, id: &EntryId) -> Result<(Forest, EntryId), TreeError> {
        let entry = self.require(id)?;
        let parent = entry.parent.clone();
        let name = duplicate_name(
            self.sibling_names(parent.as_ref()),
            &entry.name,
            entry.is_file(),
        )
        .ok_or_else(|| {
            TreeError::Validation(format!(
                "No free duplicate name for '{}' after {} attempts",
                entry.name, MAX_DUPLICATE_ATTEMPTS
            ))
        })?;

        let content = entry.content().unwrap_or_default().to_string();
        self.create_entry(parent.as_ref(), &name, entry.kind(), content)
    }

    /// Walk `segments` below `start`, creating any folder that is missing.
    ///
    /// Existing folders are reused only on an exact name match. Returns the
    /// innermost folder id, or `start` when `segments` is empty.
    pub fn ensure_folder_path(
        &self,
        start: Option<&EntryId>,
        segments: &[&str],
    ) -> Result<(Forest, Option<EntryId>), TreeError> {
        self.folder_path(start)?;
        let mut forest = self.clone();
        let mut current = start.cloned();

        for segment in segments {
            let existing = forest
                .children_of(current.as_ref())
                .iter()
                .filter_map(|c| forest.get(c))
                .find(|e| e.is_folder() && names_collide(&e.name, segment))
                .map(|e| e.id.clone());

            current = Some(match existing {
                Some(id) => id,
                None => {
                    let (next, id) = forest.create_folder(current.as_ref(), segment)?;
                    forest = next;
                    id
                }
            });
        }
        Ok((forest, current))
    }

    /// Replace a file's content; structure is untouched
    pub fn update_content(&self, id: &EntryId, content: &str) -> Result<Forest, TreeError> {
        let entry = self.require(id)?;
        match entry.content() {
            None => Err(TreeError::Validation(format!(
                "Folder '{}' cannot hold content",
                entry.path
            ))),
            Some(current) if current == content => Ok(self.clone()),
            Some(_) => {
                let mut draft = self.draft();
                if let Some(e) = draft.entry_mut(id) {
                    e.payload = super::entry::Payload::File {
                        content: content.to_string(),
                    };
                }
                Ok(draft.finish())
            }
        }
    }

    pub fn update_content_by_path(&self, raw_path: &str, content: &str) -> Result<Forest, TreeError> {
        let id = self
            .find_by_path(raw_path)
            .map(|e| e.id.clone())
            .ok_or_else(|| TreeError::NotFound(format!("No entry at path '{}'", raw_path)))?;
        self.update_content(&id, content)
    }

    fn require(&self, id: &EntryId) -> Result<&Entry, TreeError> {
        self.get(id)
            .ok_or_else(|| TreeError::NotFound(format!("Entry {} not found", id)))
    }

    /// Path of a destination folder; `""` for the root
    fn folder_path(&self, folder: Option<&EntryId>) -> Result<String, TreeError> {
        match folder {
            None => Ok(String::new()),
            Some(id) => {
                let entry = self
                    .get(id)
                    .ok_or_else(|| TreeError::NotFound(format!("Folder {} not found", id)))?;
                if entry.is_folder() {
                    Ok(entry.path.clone())
                } else {
                    Err(TreeError::NotFound(format!("Entry {} is not a folder", id)))
                }
            }
        }
    }
}
