//! Entry: one file or folder in the workspace tree.

use crate::types::{EntryId, EntryKind};

/// Kind-specific data; a file never has children and a folder never has content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    File { content: String },
    /// Child ids in display order
    Folder { children: Vec<EntryId> },
}

/// Arena node for a single file or folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    /// Normalized, slash-joined ancestor names followed by `name`
    pub path: String,
    pub parent: Option<EntryId>,
    pub payload: Payload,
}

impl Entry {
    pub fn new_file(
        id: EntryId,
        name: String,
        path: String,
        parent: Option<EntryId>,
        content: String,
    ) -> Self {
        Entry {
            id,
            name,
            path,
            parent,
            payload: Payload::File { content },
        }
    }

    pub fn new_folder(id: EntryId, name: String, path: String, parent: Option<EntryId>) -> Self {
        Entry {
            id,
            name,
            path,
            parent,
            payload: Payload::Folder {
                children: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self.payload {
            Payload::File { .. } => EntryKind::File,
            Payload::Folder { .. } => EntryKind::Folder,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.payload, Payload::Folder { .. })
    }

    pub fn is_file(&self) -> bool {
        !self.is_folder()
    }

    /// File content; `None` for folders
    pub fn content(&self) -> Option<&str> {
        match &self.payload {
            Payload::File { content } => Some(content),
            Payload::Folder { .. } => None,
        }
    }

    /// Child ids; empty for files
    pub fn children(&self) -> &[EntryId] {
        match &self.payload {
            Payload::Folder { children } => children,
            Payload::File { .. } => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<EntryId>> {
        match &mut self.payload {
            Payload::Folder { children } => Some(children),
            Payload::File { .. } => None,
        }
    }
}
