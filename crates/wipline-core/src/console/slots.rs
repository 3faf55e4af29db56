//! Display slot pool and the attach/detach allocation policy
//!
//! Only the most specific renderable operations get a slot: an operation
//! with live children never holds one, and a child always displaces its
//! parent. When a leaf finishes its slot goes back to the parent if the
//! parent can be shown, otherwise to the operation that has waited longest.
//!
//! Free slots are kept as a stack so the most recently freed line is reused
//! first, which keeps neighbouring lines stable. Operations waiting for a
//! slot are kept in a FIFO queue.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use super::layout::LayoutPolicy;
use super::surface::{RenderSurface, SlotId};
use crate::events::OperationId;
use crate::progress::{ProgressOperation, ProgressOperations};

/// One operation bound to one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    pub operation: OperationId,
    pub slot: SlotId,
}

/// Bookkeeping of which operation shows in which slot
#[derive(Debug, Default)]
pub struct SlotPool {
    unused: Vec<SlotId>,
    assigned: HashMap<OperationId, Association>,
    unassigned: VecDeque<OperationId>,
}

impl SlotPool {
    /// Pool over the slots a surface already has; the first one is handed
    /// out first
    pub fn new(initial: impl IntoIterator<Item = SlotId>) -> Self {
        let mut unused: Vec<SlotId> = initial.into_iter().collect();
        unused.reverse();
        Self {
            unused,
            ..Self::default()
        }
    }

    /// Give `id` a slot if it should be displayed
    ///
    /// Skipped when the operation is unknown, already displayed, has live
    /// children or has nothing to show. A displayed parent gives up its slot
    /// first. When no slot is free the surface is grown as far as `layout`
    /// allows; if that is not enough the operation waits in the queue.
    pub fn attach<S, L>(
        &mut self,
        id: OperationId,
        tree: &ProgressOperations,
        surface: &mut S,
        layout: &L,
    ) where
        S: RenderSurface,
        L: LayoutPolicy,
    {
        let Some(op) = tree.get(id) else {
            return;
        };
        if op.has_children() || !tree.is_lineage_renderable(op) {
            trace!(%id, "Not attaching: has children or nothing to show");
            return;
        }
        if self.assigned.contains_key(&id) {
            return;
        }

        if let Some(parent) = op.parent() {
            self.release(parent);
        }

        if self.unused.is_empty() {
            self.grow(surface, layout);
        }

        match self.unused.pop() {
            Some(slot) => {
                self.unassigned.retain(|queued| *queued != id);
                self.assigned.insert(id, Association { operation: id, slot });
                trace!(%id, ?slot, "Attached operation");
            }
            None => {
                if !self.unassigned.contains(&id) {
                    self.unassigned.push_back(id);
                    debug!(%id, waiting = self.unassigned.len(), "No free slot, operation deferred");
                }
            }
        }
    }

    /// Take a finished (or displaced) operation off the display
    ///
    /// `op` is usually the record just removed from `tree`. Its slot is
    /// freed and handed to the parent when the parent can be shown,
    /// otherwise to the longest-waiting deferred operation.
    pub fn detach<S, L>(
        &mut self,
        op: &ProgressOperation,
        tree: &ProgressOperations,
        surface: &mut S,
        layout: &L,
    ) where
        S: RenderSurface,
        L: LayoutPolicy,
    {
        let id = op.id();
        let holds_anything = self.assigned.contains_key(&id) || self.unassigned.contains(&id);
        if !holds_anything && !tree.is_lineage_renderable(op) {
            return;
        }

        self.release(id);
        self.unassigned.retain(|queued| *queued != id);

        let parent = op
            .parent()
            .and_then(|p| tree.get(p))
            .filter(|p| tree.is_lineage_renderable(p));

        match parent {
            Some(parent) => self.attach(parent.id(), tree, surface, layout),
            None => self.promote_deferred(tree, surface, layout),
        }

        self.evict_unrenderable_descendants(op, tree, surface, layout);
    }

    /// Slot currently showing `id`
    pub fn slot_of(&self, id: OperationId) -> Option<SlotId> {
        self.assigned.get(&id).map(|a| a.slot)
    }

    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.assigned.values()
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }

    /// Free slots, the next one to be handed out last
    pub fn unused(&self) -> &[SlotId] {
        &self.unused
    }

    /// Deferred operations, longest waiting first
    pub fn unassigned(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.unassigned.iter().copied()
    }

    /// Total slots known to the pool
    pub fn capacity(&self) -> usize {
        self.unused.len() + self.assigned.len()
    }

    /// Hand free slots to waiting operations, longest waiting first
    ///
    /// Keeps popping the queue while slots remain free, so an operation that
    /// gained children while it waited is dropped from the queue and the next
    /// one gets the slot instead.
    fn promote_deferred<S, L>(&mut self, tree: &ProgressOperations, surface: &mut S, layout: &L)
    where
        S: RenderSurface,
        L: LayoutPolicy,
    {
        while !self.unused.is_empty() {
            let Some(next) = self.unassigned.pop_front() else {
                break;
            };
            trace!(%next, "Promoting deferred operation");
            self.attach(next, tree, surface, layout);
        }
    }

    /// Children of an operation that finished early are orphaned; those that
    /// only had something to show through it lose their slot or place in the
    /// queue.
    ///
    /// An orphan is not kept on screen with its finished parent's message:
    /// once the parent leaves the tree its text is gone too, even though the
    /// orphan itself is still running.
    fn evict_unrenderable_descendants<S, L>(
        &mut self,
        op: &ProgressOperation,
        tree: &ProgressOperations,
        surface: &mut S,
        layout: &L,
    ) where
        S: RenderSurface,
        L: LayoutPolicy,
    {
        let mut pending: Vec<OperationId> = op.children().iter().copied().collect();
        while let Some(id) = pending.pop() {
            let Some(descendant) = tree.get(id) else {
                continue;
            };
            if tree.is_lineage_renderable(descendant) {
                continue;
            }
            pending.extend(descendant.children().iter().copied());
            if self.assigned.contains_key(&id) || self.unassigned.contains(&id) {
                debug!(%id, "Evicting operation left without a message");
                self.detach(descendant, tree, surface, layout);
            }
        }
    }

    fn release(&mut self, id: OperationId) {
        if let Some(association) = self.assigned.remove(&id) {
            trace!(%id, slot = ?association.slot, "Released slot");
            self.unused.push(association.slot);
        }
    }

    /// Ask for one more slot than is currently assigned. Never shrinks.
    fn grow<S, L>(&mut self, surface: &mut S, layout: &L)
    where
        S: RenderSurface,
        L: LayoutPolicy,
    {
        let current = surface.slot_count();
        let permitted = layout.permitted_slot_count(self.assigned.len() + 1);
        if permitted <= current {
            trace!(current, permitted, "Work-in-progress area at its limit");
            return;
        }

        surface.grow_to(permitted);
        for idx in (current..permitted).rev() {
            self.unused.push(SlotId(idx));
        }
        debug!(from = current, to = permitted, "Grew work-in-progress area");
    }
}
