//! Project records.

use crate::error::StorageError;
use crate::types::ProjectId;
use serde::{Deserialize, Serialize};

/// Project: named container for a set of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    pub updated_at: i64,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        let now = now_millis();
        Project {
            id,
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at`, never moving it backwards
    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at);
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Project store interface
pub trait ProjectStore: Send + Sync {
    fn next_project_id(&self) -> Result<ProjectId, StorageError>;

    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StorageError>;

    fn put_project(&self, project: &Project) -> Result<(), StorageError>;

    /// Returns false when the project did not exist
    fn delete_project(&self, id: &ProjectId) -> Result<bool, StorageError>;

    /// All projects, most recently updated first
    fn list_projects(&self) -> Result<Vec<Project>, StorageError>;
}
