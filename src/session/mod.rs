//! Workspace session
//!
//! Owns the editable tree of one open project: the current forest, the active
//! file, undo/redo history and the dirty flag. Structural edits record history;
//! content edits only mark the session dirty. When an [`Autosave`] is attached
//! every change is forwarded to it.

pub mod autosave;

pub use autosave::{Autosave, AutosaveStats, StoreSink, SyncSink, DEFAULT_DEBOUNCE};

use crate::error::{ApiError, TreeError};
use crate::flat::{flatten, FlatRecord};
use crate::history::{HistoryStack, DEFAULT_HISTORY_CAPACITY};
use crate::template;
use crate::tree::{path, Direction, Forest};
use crate::types::EntryId;
use tracing::debug;

/// History entry: a tree plus the selection that went with it
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub forest: Forest,
    pub active: Option<EntryId>,
}

pub struct WorkspaceSession {
    forest: Forest,
    active: Option<EntryId>,
    history: HistoryStack<Snapshot>,
    dirty: bool,
    autosave: Option<Autosave>,
}

impl WorkspaceSession {
    pub fn new(forest: Forest) -> Self {
        Self::with_capacity(forest, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(forest: Forest, history_capacity: usize) -> Self {
        let active = forest.first_file().cloned();
        Self {
            forest,
            active,
            history: HistoryStack::with_capacity(history_capacity),
            dirty: false,
            autosave: None,
        }
    }

    /// Session over the default project template
    pub fn from_template() -> Self {
        Self::new(template::default_forest())
    }

    /// Forward future changes to `autosave`
    pub fn attach_autosave(&mut self, autosave: Autosave) {
        self.autosave = Some(autosave);
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn active(&self) -> Option<&EntryId> {
        self.active.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn autosave_stats(&self) -> Option<AutosaveStats> {
        self.autosave.as_ref().map(|a| a.stats())
    }

    /// Flat listing of the current tree
    pub fn records(&self) -> Vec<FlatRecord> {
        flatten(&self.forest)
    }

    pub fn set_active(&mut self, id: &EntryId) -> Result<(), TreeError> {
        if !self.forest.contains(id) {
            return Err(TreeError::NotFound(format!("Entry {} not found", id)));
        }
        self.active = Some(id.clone());
        Ok(())
    }

    /// Replace the tree wholesale (e.g. after loading from the store).
    ///
    /// History is cleared and the session starts clean. The active file is
    /// the one at `active_path`, falling back to the first file.
    pub fn load(&mut self, forest: Forest, active_path: Option<&str>) {
        self.active = active_path
            .and_then(|p| forest.find_by_path(p))
            .filter(|e| e.is_file())
            .map(|e| e.id.clone())
            .or_else(|| forest.first_file().cloned());
        self.forest = forest;
        self.history.clear();
        self.dirty = false;
    }

    /// Discard everything and start over from the template
    pub fn reset(&mut self) {
        let forest = template::default_forest();
        self.active = forest.first_file().cloned();
        self.forest = forest;
        self.history.clear();
        self.mark_dirty();
    }

    pub fn create_file(
        &mut self,
        parent: Option<&EntryId>,
        name: &str,
        content: &str,
    ) -> Result<EntryId, TreeError> {
        let (next, id) = self.forest.create_file(parent, name, content)?;
        self.commit(next);
        self.active = Some(id.clone());
        Ok(id)
    }

    pub fn create_folder(&mut self, parent: Option<&EntryId>, name: &str) -> Result<EntryId, TreeError> {
        let (next, id) = self.forest.create_folder(parent, name)?;
        self.commit(next);
        Ok(id)
    }

    pub fn rename(&mut self, id: &EntryId, name: &str) -> Result<(), TreeError> {
        let next = self.forest.rename_node(id, name)?;
        self.commit(next);
        Ok(())
    }

    pub fn move_to_folder(
        &mut self,
        id: &EntryId,
        dest: Option<&EntryId>,
        index: Option<usize>,
    ) -> Result<(), TreeError> {
        let next = self.forest.move_node_to_folder(id, dest, index)?;
        self.commit(next);
        Ok(())
    }

    pub fn move_up(&mut self, id: &EntryId) -> Result<(), TreeError> {
        let next = self.forest.move_node_within_siblings(id, Direction::Up)?;
        self.commit(next);
        Ok(())
    }

    pub fn move_down(&mut self, id: &EntryId) -> Result<(), TreeError> {
        let next = self.forest.move_node_within_siblings(id, Direction::Down)?;
        self.commit(next);
        Ok(())
    }

    pub fn move_to_parent(&mut self, id: &EntryId) -> Result<(), TreeError> {
        let next = self.forest.move_node_to_parent_folder(id)?;
        self.commit(next);
        Ok(())
    }

    pub fn delete(&mut self, id: &EntryId) -> Result<(), TreeError> {
        let next = self.forest.delete_node(id)?;
        self.commit(next);
        Ok(())
    }

    pub fn duplicate(&mut self, id: &EntryId) -> Result<EntryId, TreeError> {
        let (next, copy) = self.forest.duplicate_node(id)?;
        self.commit(next);
        Ok(copy)
    }

    /// Walk or create `segments` below `start`; one history entry at most
    pub fn ensure_folder_path(
        &mut self,
        start: Option<&EntryId>,
        segments: &[&str],
    ) -> Result<Option<EntryId>, TreeError> {
        let (next, folder) = self.forest.ensure_folder_path(start, segments)?;
        self.commit(next);
        Ok(folder)
    }

    /// Create a file at a slash path, creating missing folders on the way
    pub fn create_file_at_path(&mut self, raw_path: &str, content: &str) -> Result<EntryId, TreeError> {
        let normalized = path::normalize(raw_path);
        let segments: Vec<&str> = path::segments(&normalized).collect();
        let Some((name, folders)) = segments.split_last() else {
            return Err(TreeError::Validation(format!("'{}' is not a file path", raw_path)));
        };
        let (with_folders, parent) = self.forest.ensure_folder_path(None, folders)?;
        let (next, id) = with_folders.create_file(parent.as_ref(), name, content)?;
        self.commit(next);
        self.active = Some(id.clone());
        Ok(id)
    }

    /// Edit file content without recording history
    pub fn update_content(&mut self, id: &EntryId, content: &str) -> Result<(), TreeError> {
        let next = self.forest.update_content(id, content)?;
        self.replace_without_history(next);
        Ok(())
    }

    pub fn update_content_by_path(&mut self, raw_path: &str, content: &str) -> Result<(), TreeError> {
        let next = self.forest.update_content_by_path(raw_path, content)?;
        self.replace_without_history(next);
        Ok(())
    }

    /// Restore the previous snapshot; false when there is nothing to undo
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    /// Push the latest tree now when autosave is attached
    pub async fn flush(&mut self) -> Result<(), ApiError> {
        if let Some(autosave) = &self.autosave {
            autosave.flush().await?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Flush pending changes and stop autosave
    pub async fn close(mut self) -> Result<(), ApiError> {
        match self.autosave.take() {
            Some(autosave) => autosave.shutdown().await,
            None => Ok(()),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            forest: self.forest.clone(),
            active: self.active.clone(),
        }
    }

    /// Install a structural result; unchanged forests leave history alone
    fn commit(&mut self, next: Forest) {
        if next.ptr_eq(&self.forest) {
            return;
        }
        let previous = self.snapshot();
        self.history.record(previous);
        self.forest = next;
        self.repair_active();
        self.mark_dirty();
        debug!(entries = self.forest.len(), undo_depth = self.history.undo_depth(), "Committed tree change");
    }

    fn replace_without_history(&mut self, next: Forest) {
        if next.ptr_eq(&self.forest) {
            return;
        }
        self.forest = next;
        self.mark_dirty();
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.forest = snapshot.forest;
        self.active = snapshot.active;
        self.repair_active();
        self.mark_dirty();
    }

    /// Fall back to the first file when the active entry is gone
    fn repair_active(&mut self) {
        let valid = self
            .active
            .as_ref()
            .map(|id| self.forest.contains(id))
            .unwrap_or(false);
        if !valid {
            self.active = self.forest.first_file().cloned();
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        if let Some(autosave) = &self.autosave {
            autosave.schedule(self.forest.clone());
        }
    }
}
