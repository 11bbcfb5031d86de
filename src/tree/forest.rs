//! Forest: immutable snapshot of the workspace tree.
//!
//! Entries live in an arena keyed by [`EntryId`] with parent back-references
//! and ordered child id lists. A snapshot is an `Arc` over the arena; edits go
//! through a [`ForestDraft`] that copies the index but shares every untouched
//! entry (and its content) with the source snapshot.

use super::entry::Entry;
use super::path;
use super::validation::name_key;
use crate::error::TreeError;
use crate::types::EntryId;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct ForestState {
    nodes: HashMap<EntryId, Arc<Entry>>,
    roots: Vec<EntryId>,
}

/// Immutable tree snapshot; cloning is O(1)
#[derive(Debug, Clone, Default)]
pub struct Forest {
    state: Arc<ForestState>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when both handles point at the same snapshot
    pub fn ptr_eq(&self, other: &Forest) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn len(&self) -> usize {
        self.state.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.nodes.is_empty()
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.state.nodes.get(id).map(|e| e.as_ref())
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.state.nodes.contains_key(id)
    }

    pub fn roots(&self) -> &[EntryId] {
        &self.state.roots
    }

    /// Children of a folder, or the root list for `None`
    pub fn children_of(&self, parent: Option<&EntryId>) -> &[EntryId] {
        match parent {
            None => &self.state.roots,
            Some(id) => self.get(id).map(|e| e.children()).unwrap_or(&[]),
        }
    }

    pub fn parent_of(&self, id: &EntryId) -> Option<&EntryId> {
        self.get(id).and_then(|e| e.parent.as_ref())
    }

    /// True when `candidate` lies strictly inside `ancestor`'s subtree
    pub fn is_descendant(&self, ancestor: &EntryId, candidate: &EntryId) -> bool {
        let mut current = self.parent_of(candidate);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    pub fn sibling_names(&self, parent: Option<&EntryId>) -> Vec<&str> {
        self.children_of(parent)
            .iter()
            .filter_map(|id| self.get(id))
            .map(|e| e.name.as_str())
            .collect()
    }

    /// Case-insensitive sibling collision check, ignoring `except`
    pub fn name_taken(&self, parent: Option<&EntryId>, name: &str, except: Option<&EntryId>) -> bool {
        let key = name_key(name);
        self.children_of(parent)
            .iter()
            .filter(|id| Some(*id) != except)
            .filter_map(|id| self.get(id))
            .any(|e| name_key(&e.name) == key)
    }

    /// Look up an entry by path; the input is normalized first
    pub fn find_by_path(&self, raw_path: &str) -> Option<&Entry> {
        let target = path::normalize(raw_path);
        if target.is_empty() || target == path::ROOT {
            return None;
        }
        self.iter().find(|e| e.path == target)
    }

    /// First file in display order
    pub fn first_file(&self) -> Option<&EntryId> {
        self.iter().find(|e| e.is_file()).map(|e| &e.id)
    }

    /// Pre-order traversal in display order
    pub fn iter(&self) -> DepthFirst<'_> {
        DepthFirst {
            forest: self,
            stack: self.state.roots.iter().rev().collect(),
        }
    }

    pub(crate) fn draft(&self) -> ForestDraft {
        ForestDraft {
            state: (*self.state).clone(),
        }
    }
}

/// Pre-order iterator over a [`Forest`]
pub struct DepthFirst<'a> {
    forest: &'a Forest,
    stack: Vec<&'a EntryId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(entry) = self.forest.get(id) {
                self.stack.extend(entry.children().iter().rev());
                return Some(entry);
            }
        }
        None
    }
}

/// Mutable working copy used to build the next snapshot
pub(crate) struct ForestDraft {
    state: ForestState,
}

impl ForestDraft {
    pub(crate) fn new() -> Self {
        ForestDraft {
            state: ForestState::default(),
        }
    }

    pub(crate) fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.state.nodes.get(id).map(|e| e.as_ref())
    }

    /// Copy-on-write access to a single entry
    pub(crate) fn entry_mut(&mut self, id: &EntryId) -> Option<&mut Entry> {
        self.state.nodes.get_mut(id).map(Arc::make_mut)
    }

    /// Add an entry to the arena without linking it
    pub(crate) fn insert(&mut self, entry: Entry) {
        self.state.nodes.insert(entry.id.clone(), Arc::new(entry));
    }

    /// Link an arena entry under `parent` (root list for `None`).
    ///
    /// `index` is clamped; `None` or out of range appends.
    pub(crate) fn attach(
        &mut self,
        id: &EntryId,
        parent: Option<&EntryId>,
        index: Option<usize>,
    ) -> Result<(), TreeError> {
        let list = match parent {
            None => &mut self.state.roots,
            Some(pid) => self
                .state
                .nodes
                .get_mut(pid)
                .map(Arc::make_mut)
                .ok_or_else(|| TreeError::NotFound(format!("Folder {} not found", pid)))?
                .children_mut()
                .ok_or_else(|| TreeError::NotFound(format!("Entry {} is not a folder", pid)))?,
        };
        match index {
            Some(i) if i <= list.len() => list.insert(i, id.clone()),
            _ => list.push(id.clone()),
        }

        let entry = self
            .entry_mut(id)
            .ok_or_else(|| TreeError::NotFound(format!("Entry {} not found", id)))?;
        entry.parent = parent.cloned();
        Ok(())
    }

    /// Unlink an entry from its parent (or the root list); returns its old index
    pub(crate) fn detach(&mut self, id: &EntryId) -> Option<usize> {
        let parent = self.get(id)?.parent.clone();
        let list = match &parent {
            None => &mut self.state.roots,
            Some(pid) => self
                .state
                .nodes
                .get_mut(pid)
                .map(Arc::make_mut)?
                .children_mut()?,
        };
        let idx = list.iter().position(|c| c == id)?;
        list.remove(idx);
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = None;
        }
        Some(idx)
    }

    /// Drop an entry and all its descendants from the arena
    pub(crate) fn remove_subtree(&mut self, id: &EntryId) -> usize {
        let mut removed = 0;
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.state.nodes.remove(&current) {
                stack.extend(entry.children().iter().cloned());
                removed += 1;
            }
        }
        removed
    }

    /// Set `id`'s path and rewrite every descendant path beneath it
    pub(crate) fn rebase_subtree(&mut self, id: &EntryId, new_path: String) {
        let mut stack = vec![(id.clone(), new_path)];
        while let Some((current, current_path)) = stack.pop() {
            let children: Vec<EntryId> = match self.entry_mut(&current) {
                Some(entry) => {
                    entry.path = current_path.clone();
                    entry.children().to_vec()
                }
                None => continue,
            };
            for child in children {
                if let Some(name) = self.get(&child).map(|c| c.name.clone()) {
                    stack.push((child, path::join(&current_path, &name)));
                }
            }
        }
    }

    /// Swap two positions within a sibling list
    pub(crate) fn swap_siblings(&mut self, parent: Option<&EntryId>, a: usize, b: usize) -> bool {
        let list = match parent {
            None => &mut self.state.roots,
            Some(pid) => match self
                .state
                .nodes
                .get_mut(pid)
                .map(Arc::make_mut)
                .and_then(|e| e.children_mut())
            {
                Some(list) => list,
                None => return false,
            },
        };
        if a >= list.len() || b >= list.len() {
            return false;
        }
        list.swap(a, b);
        true
    }

    pub(crate) fn finish(self) -> Forest {
        Forest {
            state: Arc::new(self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Forest, EntryId, EntryId, EntryId) {
        let mut draft = ForestDraft::new();
        let src = EntryId::from("src");
        let lib = EntryId::from("lib");
        let file = EntryId::from("a");
        draft.insert(Entry::new_folder(src.clone(), "src".into(), "src".into(), None));
        draft.attach(&src, None, None).unwrap();
        draft.insert(Entry::new_folder(lib.clone(), "lib".into(), "src/lib".into(), None));
        draft.attach(&lib, Some(&src), None).unwrap();
        draft.insert(Entry::new_file(file.clone(), "a.js".into(), "src/lib/a.js".into(), None, "x".into()));
        draft.attach(&file, Some(&lib), None).unwrap();
        (draft.finish(), src, lib, file)
    }

    #[test]
    fn test_depth_first_order() {
        let (forest, _, _, _) = sample();
        let paths: Vec<&str> = forest.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["src", "src/lib", "src/lib/a.js"]);
    }

    #[test]
    fn test_is_descendant() {
        let (forest, src, lib, file) = sample();
        assert!(forest.is_descendant(&src, &file));
        assert!(forest.is_descendant(&src, &lib));
        assert!(!forest.is_descendant(&file, &src));
        assert!(!forest.is_descendant(&src, &src));
    }

    #[test]
    fn test_draft_shares_untouched_entries() {
        let (forest, src, lib, file) = sample();
        let mut draft = forest.draft();
        draft.rebase_subtree(&lib, "src/pkg".into());
        let next = draft.finish();

        assert_eq!(next.get(&file).unwrap().path, "src/pkg/a.js");
        assert_eq!(forest.get(&file).unwrap().path, "src/lib/a.js");
        assert!(Arc::ptr_eq(&forest.state.nodes[&src], &next.state.nodes[&src]));
    }

    #[test]
    fn test_detach_and_remove_subtree() {
        let (forest, src, lib, _) = sample();
        let mut draft = forest.draft();
        assert_eq!(draft.detach(&lib), Some(0));
        assert_eq!(draft.remove_subtree(&lib), 2);
        let next = draft.finish();
        assert_eq!(next.len(), 1);
        assert!(next.children_of(Some(&src)).is_empty());
    }

    #[test]
    fn test_find_by_path_normalizes() {
        let (forest, _, _, file) = sample();
        assert_eq!(forest.find_by_path("/src//lib/./a.js").map(|e| &e.id), Some(&file));
        assert!(forest.find_by_path("/").is_none());
    }
}
