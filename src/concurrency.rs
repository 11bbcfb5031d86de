//! Per-project serialization of store writes
//!
//! Reconciliation replaces or diffs a whole project at a time. Two writers on
//! the same project take the project's write lock in turn; readers (listing,
//! hydration) share the read side so they never observe a half-applied
//! baseline replace.

use crate::types::ProjectId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Lock table keyed by project
pub struct ProjectLockManager {
    locks: RwLock<HashMap<ProjectId, Arc<RwLock<()>>>>,
}

impl ProjectLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Lock handle for `project`, created on first use
    pub fn get_lock(&self, project: &ProjectId) -> Arc<RwLock<()>> {
        if let Some(lock) = self.locks.read().get(project) {
            return lock.clone();
        }

        let mut map = self.locks.write();
        // Another thread may have inserted between the two locks
        map.entry(project.clone())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Drop the lock entry of a deleted project
    pub fn forget(&self, project: &ProjectId) {
        self.locks.write().remove(project);
    }

    pub fn tracked(&self) -> usize {
        self.locks.read().len()
    }
}

impl Default for ProjectLockManager {
    fn default() -> Self {
        Self::new()
    }
}
