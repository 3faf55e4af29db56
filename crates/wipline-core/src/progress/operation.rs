//! A single in-flight progress operation

use std::collections::BTreeSet;

use crate::constants;
use crate::events::OperationId;

/// One unit of work known to the operation tree
///
/// The parent link is a plain id (looked up through the tree); children are
/// maintained by [`ProgressOperations`](super::ProgressOperations), never by
/// the operation itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressOperation {
    id: OperationId,
    pub(super) parent: Option<OperationId>,
    description: Option<String>,
    status: Option<String>,
    category: String,
    pub(super) children: BTreeSet<OperationId>,
}

impl ProgressOperation {
    pub(super) fn new(
        id: OperationId,
        parent: Option<OperationId>,
        description: Option<String>,
        status: Option<String>,
        category: String,
    ) -> Self {
        Self {
            id,
            parent,
            description,
            status,
            category,
            children: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Parent operation, if it was live when this operation started
    pub fn parent(&self) -> Option<OperationId> {
        self.parent
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Live children, in id order
    pub fn children(&self) -> &BTreeSet<OperationId> {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Text to display for this operation: the status when non-empty,
    /// otherwise the description when non-empty
    pub fn message(&self) -> Option<&str> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.description.as_deref().filter(|d| !d.is_empty()))
    }

    /// Whether this is the top-level build progress operation
    pub fn is_build_progress(&self) -> bool {
        self.category == constants::progress::BUILD_PROGRESS_CATEGORY
    }

    pub(super) fn set_status(&mut self, status: String) {
        self.status = Some(status);
    }
}
