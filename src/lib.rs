//! studiotree: workspace tree engine
//!
//! Multi-file projects are edited as an in-memory tree of files and folders,
//! moved over the wire as flat `{name, path, type, content}` records, and
//! persisted as parent-linked records in sled. Paths stay consistent across
//! every edit and every tree/flat round trip.

pub mod api;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod flat;
pub mod history;
pub mod logging;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod template;
pub mod tooling;
pub mod tree;
pub mod types;

pub use api::{ProjectApi, ProjectSnapshot};
pub use error::{ApiError, StorageError, TreeError};
pub use flat::FlatRecord;
pub use session::WorkspaceSession;
pub use tree::Forest;
