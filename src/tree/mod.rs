//! In-memory workspace tree: paths, entries, the snapshot forest and its edits.

pub mod entry;
pub mod forest;
pub mod mutator;
pub mod path;
pub mod validation;

pub use entry::{Entry, Payload};
pub use forest::{DepthFirst, Forest};
pub use mutator::Direction;
