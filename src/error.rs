//! Error types for tree mutation, storage, and the project API.

use crate::types::ProjectId;
use thiserror::Error;

/// Errors raised by structural tree operations
///
/// A failed operation never partially applies: callers keep the input forest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Illegal characters, empty name, or a sibling name collision
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced node or parent does not resolve
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Errors raised by the persisted record store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Encoding error: {0}")]
    Codec(#[from] bincode::Error),

    /// Uniqueness violation on (project, path)
    #[error("Path conflict in project {project}: {path}")]
    Conflict { project: ProjectId, path: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Top-level error for the project API, reconciliation, and CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Sync failed: {0}")]
    SyncFailed(String),
}

impl ApiError {
    /// True for every flavor of not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::Tree(TreeError::NotFound(_))
                | ApiError::StorageError(StorageError::NotFound(_))
                | ApiError::ProjectNotFound(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::StorageError(StorageError::Conflict { .. }))
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
