//! Flat record transfer format
//!
//! Converts a [`Forest`] into a list of `{name, path, type, content?}` records
//! and rebuilds a forest from such a list, resolving parents either by path
//! or by the explicit parent id of persisted records.

use crate::store::PersistedEntry;
use crate::tree::forest::ForestDraft;
use crate::tree::validation::{name_key, unique_name};
use crate::tree::{path, Entry, Forest};
use crate::types::{EntryId, EntryKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// FlatRecord: one entry on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Present for files only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FlatRecord {
    pub fn file(raw_path: &str, content: impl Into<String>) -> Self {
        let path = path::normalize(raw_path);
        FlatRecord {
            name: path::file_name(&path).to_string(),
            path,
            kind: EntryKind::File,
            content: Some(content.into()),
        }
    }

    pub fn folder(raw_path: &str) -> Self {
        let path = path::normalize(raw_path);
        FlatRecord {
            name: path::file_name(&path).to_string(),
            path,
            kind: EntryKind::Folder,
            content: None,
        }
    }

    /// File content, empty when absent
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

impl From<&PersistedEntry> for FlatRecord {
    fn from(entry: &PersistedEntry) -> Self {
        FlatRecord {
            name: entry.name.clone(),
            path: entry.path.clone(),
            kind: entry.kind,
            content: (entry.kind == EntryKind::File).then(|| entry.content.clone()),
        }
    }
}

/// Depth-first pre-order listing of a forest
pub fn flatten(forest: &Forest) -> Vec<FlatRecord> {
    forest
        .iter()
        .map(|entry| FlatRecord {
            name: entry.name.clone(),
            path: entry.path.clone(),
            kind: entry.kind(),
            content: entry.content().map(str::to_string),
        })
        .collect()
}

/// Stable sort, shallowest paths first
pub fn sort_by_depth(records: &mut [FlatRecord]) {
    records.sort_by_key(|r| path::depth(&path::normalize(&r.path)));
}

/// Rebuild a forest from records whose parents are implied by their paths.
///
/// A record whose parent folder is not in the list becomes a root named after
/// its last segment, suffixed ` (n)` when another root already has that name.
/// Its descendants follow it. Records repeating an earlier path are skipped.
/// Every entry gets a fresh id.
pub fn hydrate_by_path(records: &[FlatRecord]) -> Forest {
    let mut ordered: Vec<(usize, String, &FlatRecord)> = records
        .iter()
        .map(|r| {
            let normalized = path::normalize(&r.path);
            (path::depth(&normalized), normalized, r)
        })
        .collect();
    ordered.sort_by_key(|(depth, _, _)| *depth);

    let mut draft = ForestDraft::new();
    // collision key of the record path -> (id, path in the rebuilt forest)
    let mut folders: HashMap<String, (EntryId, String)> = HashMap::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut root_names: Vec<String> = Vec::new();

    for (depth, record_path, record) in ordered {
        if depth == 0 {
            warn!(path = %record.path, "Skipping record without a path");
            continue;
        }
        if !seen.insert(name_key(&record_path)) {
            warn!(path = %record_path, "Skipping record with a duplicate path");
            continue;
        }

        let base = path::file_name(&record_path).to_string();
        let located = path::parent_of(&record_path)
            .and_then(|p| folders.get(&name_key(p)))
            .map(|(id, parent_path)| (id.clone(), path::join(parent_path, &base)));
        let (parent, name, entry_path) = match located {
            Some((parent_id, entry_path)) => (Some(parent_id), base, entry_path),
            None => {
                let name = unique_name(
                    root_names.iter().map(String::as_str),
                    &base,
                    record.kind == EntryKind::File,
                );
                if depth > 1 {
                    debug!(path = %record_path, root = %name, "Parent missing; hydrating record as a root");
                }
                root_names.push(name.clone());
                (None, name.clone(), name)
            }
        };

        let id = EntryId::generate();
        let entry = match record.kind {
            EntryKind::File => Entry::new_file(
                id.clone(),
                name,
                entry_path.clone(),
                None,
                record.content_or_empty().to_string(),
            ),
            EntryKind::Folder => Entry::new_folder(id.clone(), name, entry_path.clone(), None),
        };
        draft.insert(entry);
        if let Err(e) = draft.attach(&id, parent.as_ref(), None) {
            warn!(path = %entry_path, error = %e, "Failed to attach record");
            draft.remove_subtree(&id);
            continue;
        }
        if record.kind == EntryKind::Folder {
            folders.insert(name_key(&record_path), (id, entry_path));
        }
    }
    draft.finish()
}

/// Rebuild a forest from persisted records, linking children by parent id.
///
/// Persisted ids are kept. Records whose parent is missing (or is a file)
/// become roots at their own name; records unreachable from any root are
/// dropped.
pub fn hydrate_by_parent(entries: &[PersistedEntry]) -> Forest {
    let by_id: HashMap<&EntryId, &PersistedEntry> = entries.iter().map(|e| (&e.id, e)).collect();
    let mut children: HashMap<&EntryId, Vec<&PersistedEntry>> = HashMap::new();
    let mut roots: Vec<&PersistedEntry> = Vec::new();

    for entry in entries {
        match entry.parent_id.as_ref().and_then(|p| by_id.get(p)) {
            Some(parent) if parent.is_folder() && parent.id != entry.id => {
                children.entry(&parent.id).or_default().push(entry)
            }
            _ => roots.push(entry),
        }
    }

    let mut draft = ForestDraft::new();
    let mut placed: HashSet<&EntryId> = HashSet::new();
    let mut root_names: HashSet<String> = HashSet::new();
    // (record, parent id, parent path)
    let mut stack: Vec<(&PersistedEntry, Option<EntryId>, Option<String>)> =
        roots.into_iter().rev().map(|r| (r, None, None)).collect();

    while let Some((record, parent, parent_path)) = stack.pop() {
        if !placed.insert(&record.id) {
            continue;
        }
        let entry_path = match &parent_path {
            Some(pp) => path::join(pp, &record.name),
            None => record.name.clone(),
        };
        if parent.is_none() && !root_names.insert(name_key(&entry_path)) {
            warn!(path = %entry_path, "Skipping persisted root with a duplicate path");
            continue;
        }

        let entry = match record.kind {
            EntryKind::File => Entry::new_file(
                record.id.clone(),
                record.name.clone(),
                entry_path.clone(),
                None,
                record.content.clone(),
            ),
            EntryKind::Folder => {
                Entry::new_folder(record.id.clone(), record.name.clone(), entry_path.clone(), None)
            }
        };
        draft.insert(entry);
        if let Err(e) = draft.attach(&record.id, parent.as_ref(), None) {
            warn!(path = %entry_path, error = %e, "Failed to attach persisted record");
            draft.remove_subtree(&record.id);
            continue;
        }

        if let Some(kids) = children.get(&record.id) {
            let mut names: HashSet<String> = HashSet::new();
            let mut accepted = Vec::new();
            for kid in kids {
                if names.insert(name_key(&kid.name)) {
                    accepted.push(*kid);
                } else {
                    warn!(path = %kid.path, "Skipping persisted record with a duplicate name");
                }
            }
            stack.extend(
                accepted
                    .into_iter()
                    .rev()
                    .map(|kid| (kid, Some(record.id.clone()), Some(entry_path.clone()))),
            );
        }
    }

    let dropped = entries.len() - placed.len();
    if dropped > 0 {
        warn!(dropped, "Dropped persisted records unreachable from any root");
    }
    draft.finish()
}

/// Build records from `(path, content)` pairs, synthesizing every
/// intermediate folder.
///
/// Output is folders (sorted by path) followed by files in input order.
/// A file whose path is also needed as a folder is dropped.
pub fn records_from_file_map<I, P, C>(files: I) -> Vec<FlatRecord>
where
    I: IntoIterator<Item = (P, C)>,
    P: AsRef<str>,
    C: Into<String>,
{
    let mut folders: BTreeSet<String> = BTreeSet::new();
    let mut file_records: Vec<FlatRecord> = Vec::new();

    for (raw_path, content) in files {
        let file_path = path::normalize(raw_path.as_ref());
        if path::depth(&file_path) == 0 {
            continue;
        }
        let mut prefix = String::new();
        let segments: Vec<&str> = path::segments(&file_path).collect();
        for segment in &segments[..segments.len() - 1] {
            prefix = path::join(&prefix, segment);
            folders.insert(prefix.clone());
        }
        file_records.push(FlatRecord::file(&file_path, content));
    }

    let mut seen_files: HashSet<String> = HashSet::new();
    let files = file_records.into_iter().filter(|r| {
        if folders.contains(&r.path) {
            warn!(path = %r.path, "File path collides with a folder; dropping file");
            return false;
        }
        seen_files.insert(r.path.clone())
    });

    folders
        .iter()
        .map(|p| FlatRecord::folder(p))
        .chain(files)
        .collect()
}
