//! Scripted edits
//!
//! A JSON list of tree operations addressed by path, replayed against a
//! [`WorkspaceSession`]. Used by `studiotree edit` to batch several edits
//! into one debounced save.

use crate::error::TreeError;
use crate::session::WorkspaceSession;
use crate::tree::path;
use crate::types::EntryId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    /// Create a file, creating missing parent folders
    CreateFile {
        path: String,
        #[serde(default)]
        content: String,
    },
    /// Create every missing folder along `path`
    Mkdir { path: String },
    Rename { path: String, name: String },
    /// Move into the folder at `to` (root when absent)
    Move {
        path: String,
        #[serde(default)]
        to: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },
    MoveUp { path: String },
    MoveDown { path: String },
    Outdent { path: String },
    Delete { path: String },
    Duplicate { path: String },
    Write { path: String, content: String },
    Undo,
    Redo,
}

fn resolve(session: &WorkspaceSession, raw_path: &str) -> Result<EntryId, TreeError> {
    session
        .forest()
        .find_by_path(raw_path)
        .map(|e| e.id.clone())
        .ok_or_else(|| TreeError::NotFound(format!("No entry at '{}'", raw_path)))
}

fn resolve_folder(session: &WorkspaceSession, raw_path: Option<&str>) -> Result<Option<EntryId>, TreeError> {
    match raw_path.map(path::normalize).filter(|p| !p.is_empty()) {
        None => Ok(None),
        Some(p) => resolve(session, &p).map(Some),
    }
}

/// Apply one operation
pub fn apply_op(session: &mut WorkspaceSession, op: &ScriptOp) -> Result<(), TreeError> {
    match op {
        ScriptOp::CreateFile { path, content } => {
            session.create_file_at_path(path, content)?;
        }
        ScriptOp::Mkdir { path: raw } => {
            let normalized = path::normalize(raw);
            let segments: Vec<&str> = path::segments(&normalized).collect();
            session.ensure_folder_path(None, &segments)?;
        }
        ScriptOp::Rename { path, name } => {
            let id = resolve(session, path)?;
            session.rename(&id, name)?;
        }
        ScriptOp::Move { path, to, index } => {
            let id = resolve(session, path)?;
            let dest = resolve_folder(session, to.as_deref())?;
            session.move_to_folder(&id, dest.as_ref(), *index)?;
        }
        ScriptOp::MoveUp { path } => {
            let id = resolve(session, path)?;
            session.move_up(&id)?;
        }
        ScriptOp::MoveDown { path } => {
            let id = resolve(session, path)?;
            session.move_down(&id)?;
        }
        ScriptOp::Outdent { path } => {
            let id = resolve(session, path)?;
            session.move_to_parent(&id)?;
        }
        ScriptOp::Delete { path } => {
            let id = resolve(session, path)?;
            session.delete(&id)?;
        }
        ScriptOp::Duplicate { path } => {
            let id = resolve(session, path)?;
            session.duplicate(&id)?;
        }
        ScriptOp::Write { path, content } => {
            session.update_content_by_path(path, content)?;
        }
        ScriptOp::Undo => {
            session.undo();
        }
        ScriptOp::Redo => {
            session.redo();
        }
    }
    Ok(())
}

/// Apply `ops` in order, stopping at the first failure.
///
/// Returns the number applied. Operations before a failure stay applied.
pub fn apply_script(session: &mut WorkspaceSession, ops: &[ScriptOp]) -> Result<usize, TreeError> {
    for (applied, op) in ops.iter().enumerate() {
        apply_op(session, op).map_err(|e| match e {
            TreeError::Validation(msg) => TreeError::Validation(format!("step {}: {}", applied + 1, msg)),
            TreeError::NotFound(msg) => TreeError::NotFound(format!("step {}: {}", applied + 1, msg)),
        })?;
    }
    Ok(ops.len())
}
