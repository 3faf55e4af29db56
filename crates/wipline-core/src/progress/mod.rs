//! Progress operation tracking
//!
//! Maintains the tree of in-flight operations built from start, progress and
//! complete events.

mod operation;
mod operations;

pub use operation::ProgressOperation;
pub use operations::{Lineage, ProgressOperations};
