//! Arena of live progress operations
//!
//! Operations are stored by id; parent links and child sets are ids into the
//! same map, so the tree never holds references into itself.

use std::collections::HashMap;

use tracing::{trace, warn};

use super::operation::ProgressOperation;
use crate::events::OperationId;

/// Tree of in-flight operations
///
/// Every method is total: unknown ids are ignored rather than rejected,
/// since producers may race with this consumer.
#[derive(Debug, Default)]
pub struct ProgressOperations {
    by_id: HashMap<OperationId, ProgressOperation>,
}

impl ProgressOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new operation
    ///
    /// The operation is linked under `parent_id` when that parent is live,
    /// otherwise it becomes a root. A start for an id that is already live is
    /// ignored and the existing operation returned.
    pub fn start(
        &mut self,
        description: Option<String>,
        status: Option<String>,
        category: String,
        id: OperationId,
        parent_id: Option<OperationId>,
    ) -> &ProgressOperation {
        if self.by_id.contains_key(&id) {
            warn!(%id, "Ignoring start for an operation that is already running");
            return &self.by_id[&id];
        }

        let parent = parent_id.filter(|p| self.by_id.contains_key(p));
        if parent.is_none() {
            if let Some(unknown) = parent_id {
                trace!(%id, parent = %unknown, "Parent not running, starting as root");
            }
        }

        if let Some(parent_op) = parent.and_then(|p| self.by_id.get_mut(&p)) {
            parent_op.children.insert(id);
        }

        self.by_id
            .entry(id)
            .or_insert_with(|| ProgressOperation::new(id, parent, description, status, category))
    }

    /// Update the status of a running operation
    ///
    /// Returns `false` when the id is unknown.
    pub fn progress(&mut self, status: String, id: OperationId) -> bool {
        match self.by_id.get_mut(&id) {
            Some(op) => {
                op.set_status(status);
                true
            }
            None => {
                trace!(%id, "Progress for unknown operation");
                false
            }
        }
    }

    /// Remove a finished operation and hand back its record
    ///
    /// The operation leaves its parent's child set, and its own children are
    /// orphaned (they become roots). Returns `None` for unknown ids.
    pub fn complete(&mut self, id: OperationId) -> Option<ProgressOperation> {
        let Some(op) = self.by_id.remove(&id) else {
            trace!(%id, "Completion for unknown operation");
            return None;
        };

        if let Some(parent) = op.parent().and_then(|p| self.by_id.get_mut(&p)) {
            parent.children.remove(&id);
        }
        for child in &op.children {
            if let Some(child) = self.by_id.get_mut(child) {
                child.parent = None;
            }
        }

        Some(op)
    }

    pub fn get(&self, id: OperationId) -> Option<&ProgressOperation> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Live parent of a live operation
    pub fn parent_of(&self, id: OperationId) -> Option<&ProgressOperation> {
        self.get(id)
            .and_then(ProgressOperation::parent)
            .and_then(|p| self.get(p))
    }

    pub fn has_children(&self, id: OperationId) -> bool {
        self.get(id).is_some_and(ProgressOperation::has_children)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Walk from `op` up through its live ancestors, `op` first
    ///
    /// `op` does not need to be in the tree, which lets callers inspect the
    /// lineage of an operation that just completed.
    pub fn lineage<'a>(&'a self, op: &'a ProgressOperation) -> Lineage<'a> {
        Lineage {
            tree: self,
            next: Some(op),
        }
    }

    /// Whether a live operation has something to display
    pub fn is_renderable(&self, id: OperationId) -> bool {
        self.get(id).is_some_and(|op| self.is_lineage_renderable(op))
    }

    /// Whether `op` or an ancestor below the build progress boundary carries
    /// a message
    pub fn is_lineage_renderable(&self, op: &ProgressOperation) -> bool {
        self.lineage(op)
            .take_while(|current| !current.is_build_progress())
            .any(|current| current.message().is_some())
    }
}

/// Iterator over an operation and its ancestors
#[derive(Debug)]
pub struct Lineage<'a> {
    tree: &'a ProgressOperations,
    next: Option<&'a ProgressOperation>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a ProgressOperation;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent().and_then(|p| self.tree.get(p));
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::progress::BUILD_PROGRESS_CATEGORY;

    fn id(raw: u64) -> OperationId {
        OperationId(raw)
    }

    fn start(tree: &mut ProgressOperations, raw: u64, parent: Option<u64>, status: Option<&str>) {
        tree.start(
            None,
            status.map(str::to_string),
            "task".to_string(),
            id(raw),
            parent.map(id),
        );
    }

    #[test]
    fn test_start_links_known_parent() {
        let mut tree = ProgressOperations::new();
        start(&mut tree, 1, None, Some("root"));
        start(&mut tree, 2, Some(1), Some("child"));

        assert_eq!(tree.get(id(2)).unwrap().parent(), Some(id(1)));
        assert!(tree.has_children(id(1)));
        assert_eq!(tree.parent_of(id(2)).unwrap().id(), id(1));
    }

    #[test]
    fn test_start_with_unknown_parent_becomes_root() {
        let mut tree = ProgressOperations::new();
        start(&mut tree, 2, Some(99), Some("orphan"));

        assert_eq!(tree.get(id(2)).unwrap().parent(), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_duplicate_start_keeps_original() {
        let mut tree = ProgressOperations::new();
        start(&mut tree, 1, None, Some("first"));
        start(&mut tree, 1, None, Some("second"));

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(id(1)).unwrap().status(), Some("first"));
    }

    #[test]
    fn test_progress_updates_status_and_ignores_unknown() {
        let mut tree = ProgressOperations::new();
        start(&mut tree, 1, None, None);

        assert!(tree.progress("compiling".to_string(), id(1)));
        assert_eq!(tree.get(id(1)).unwrap().message(), Some("compiling"));
        assert!(!tree.progress("nope".to_string(), id(5)));
    }

    #[test]
    fn test_complete_unlinks_from_parent() {
        let mut tree = ProgressOperations::new();
        start(&mut tree, 1, None, Some("root"));
        start(&mut tree, 2, Some(1), Some("child"));

        let removed = tree.complete(id(2)).unwrap();
        assert_eq!(removed.id(), id(2));
        assert!(!tree.contains(id(2)));
        assert!(!tree.has_children(id(1)));
        assert!(tree.complete(id(2)).is_none());
    }

    #[test]
    fn test_complete_orphans_children() {
        let mut tree = ProgressOperations::new();
        start(&mut tree, 1, None, Some("root"));
        start(&mut tree, 2, Some(1), None);

        tree.complete(id(1));
        assert_eq!(tree.get(id(2)).unwrap().parent(), None);

        // A reused id must not pick up the stale link
        start(&mut tree, 1, Some(2), Some("again"));
        assert_eq!(tree.lineage(tree.get(id(1)).unwrap()).count(), 2);
    }

    #[test]
    fn test_renderable_through_ancestor_message() {
        let mut tree = ProgressOperations::new();
        start(&mut tree, 1, None, Some("root"));
        start(&mut tree, 2, Some(1), None);
        start(&mut tree, 3, None, None);

        assert!(tree.is_renderable(id(2)));
        assert!(!tree.is_renderable(id(3)));
        assert!(!tree.is_renderable(id(42)));
    }

    #[test]
    fn test_renderable_stops_at_build_progress_boundary() {
        let mut tree = ProgressOperations::new();
        tree.start(
            Some("Build".to_string()),
            Some("50%".to_string()),
            BUILD_PROGRESS_CATEGORY.to_string(),
            id(1),
            None,
        );
        start(&mut tree, 2, Some(1), None);

        assert!(!tree.is_renderable(id(1)));
        assert!(!tree.is_renderable(id(2)));

        tree.progress(":app:compile".to_string(), id(2));
        assert!(tree.is_renderable(id(2)));
    }

    #[test]
    fn test_lineage_of_completed_record() {
        let mut tree = ProgressOperations::new();
        start(&mut tree, 1, None, Some("root"));
        start(&mut tree, 2, Some(1), None);

        let removed = tree.complete(id(2)).unwrap();
        let ids: Vec<_> = tree.lineage(&removed).map(ProgressOperation::id).collect();
        assert_eq!(ids, vec![id(2), id(1)]);
        assert!(tree.is_lineage_renderable(&removed));
    }
}
