//! Directory import
//!
//! Walks a directory on disk and produces flat records ready for
//! reconciliation. Folders are inferred from file paths; empty directories
//! are kept as explicit folder records.

use crate::error::{ApiError, StorageError};
use crate::flat::{records_from_file_map, FlatRecord};
use crate::tree::path;
use crate::types::EntryKind;
use std::collections::HashSet;
use std::path::{Component, Path};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names never imported
pub const DEFAULT_SKIP_DIRS: &[&str] = &[".git", "node_modules", "target", "dist"];

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub skip_dirs: Vec<String>,
    /// Include entries whose name starts with a dot
    pub include_hidden: bool,
    /// Files larger than this are skipped
    pub max_file_bytes: u64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            include_hidden: false,
            max_file_bytes: 1024 * 1024,
        }
    }
}

impl ImportOptions {
    fn skipped(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if !self.include_hidden && name.starts_with('.') {
            return true;
        }
        entry.file_type().is_dir() && self.skip_dirs.iter().any(|s| *s == name)
    }
}

/// Read every text file under `root` into flat records.
///
/// Binary (non UTF-8) and oversized files are skipped with a warning.
pub fn read_directory(root: &Path, options: &ImportOptions) -> Result<Vec<FlatRecord>, ApiError> {
    let root = dunce::canonicalize(root).map_err(StorageError::IoError)?;
    if !root.is_dir() {
        return Err(StorageError::InvalidInput(format!("{} is not a directory", root.display())).into());
    }

    let mut files: Vec<(String, String)> = Vec::new();
    let mut dirs: Vec<String> = Vec::new();

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !options.skipped(e));

    for entry in walker {
        let entry = entry.map_err(|e| StorageError::IoError(e.into()))?;
        let Some(relative) = relative_slash_path(&root, entry.path()) else {
            continue;
        };
        let file_type = entry.file_type();

        if file_type.is_dir() {
            dirs.push(relative);
        } else if file_type.is_file() {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > options.max_file_bytes {
                warn!(path = %relative, size, "Skipping oversized file");
                continue;
            }
            let bytes = std::fs::read(entry.path()).map_err(StorageError::IoError)?;
            match String::from_utf8(bytes) {
                Ok(content) => files.push((relative, content)),
                Err(_) => warn!(path = %relative, "Skipping binary file"),
            }
        }
    }

    let inferred = records_from_file_map(files);
    let known: HashSet<String> = inferred
        .iter()
        .filter(|r| r.kind == EntryKind::Folder)
        .map(|r| r.path.clone())
        .collect();
    let mut records: Vec<FlatRecord> = dirs
        .iter()
        .filter(|d| !known.contains(d.as_str()))
        .map(|d| FlatRecord::folder(d))
        .collect();
    records.extend(inferred);

    debug!(root = %root.display(), records = records.len(), "Read directory");
    Ok(records)
}

/// `root`-relative path joined with `/`; `None` for the root itself
fn relative_slash_path(root: &Path, full: &Path) -> Option<String> {
    let relative = full.strip_prefix(root).ok()?;
    let joined = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .fold(String::new(), |acc, segment| path::join(&acc, &segment));
    (!joined.is_empty()).then_some(joined)
}

/// Write records below `dest`, creating folders as needed
pub fn write_directory(dest: &Path, records: &[FlatRecord]) -> Result<usize, ApiError> {
    let mut written = 0;
    for record in records {
        let normalized = path::normalize(&record.path);
        if normalized.is_empty() {
            continue;
        }
        let target = path::segments(&normalized).fold(dest.to_path_buf(), |acc, s| acc.join(s));
        match record.kind {
            EntryKind::Folder => std::fs::create_dir_all(&target).map_err(StorageError::IoError)?,
            EntryKind::File => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).map_err(StorageError::IoError)?;
                }
                std::fs::write(&target, record.content_or_empty()).map_err(StorageError::IoError)?;
                written += 1;
            }
        }
    }
    Ok(written)
}
