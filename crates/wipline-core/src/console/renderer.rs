//! Work-in-progress renderer
//!
//! Sits in the output pipeline in front of another listener. It keeps the
//! operation tree and slot pool up to date from progress events, pushes
//! status lines to the render surface, and forwards every event downstream
//! unchanged.

use std::collections::HashSet;

use tracing::trace;

use super::formatter::WorkInProgressFormatter;
use super::layout::LayoutPolicy;
use super::slots::{Association, SlotPool};
use super::surface::{RenderSurface, SlotId};
use crate::events::{BatchOutputEventListener, OperationId, OutputEvent, OutputEventListener};
use crate::progress::ProgressOperations;

/// Renders the most specific running operations into a bounded set of
/// console lines
///
/// Delivery must be serialized: one event or batch at a time, in order. The
/// renderer holds no locks; feed it from a single consumer such as
/// [`ThrottledBatcher`](crate::throttle::ThrottledBatcher) when there are
/// several producers.
#[derive(Debug)]
pub struct WorkInProgressRenderer<D, S, L> {
    listener: D,
    operations: ProgressOperations,
    slots: SlotPool,
    surface: S,
    formatter: WorkInProgressFormatter,
    layout: L,
}

impl<D, S, L> WorkInProgressRenderer<D, S, L>
where
    D: OutputEventListener,
    S: RenderSurface,
    L: LayoutPolicy,
{
    /// Renderer forwarding to `listener`, drawing on `surface`
    ///
    /// Slots the surface already has are used before the area is grown.
    pub fn new(listener: D, surface: S, formatter: WorkInProgressFormatter, layout: L) -> Self {
        let slots = SlotPool::new(surface.slots());
        Self {
            listener,
            operations: ProgressOperations::new(),
            slots,
            surface,
            formatter,
            layout,
        }
    }

    /// Push current state to the surface
    ///
    /// Displayed operations get a fresh status line, free slots the idle
    /// text. Nothing else changes.
    pub fn render_now(&mut self) {
        for association in self.slots.associations() {
            if let Some(op) = self.operations.get(association.operation) {
                let text = self.formatter.format(&self.operations, op);
                self.surface.set_text(association.slot, &text);
            }
        }
        for slot in self.slots.unused() {
            self.surface.set_text(*slot, self.formatter.idle());
        }
    }

    /// Current operation to slot bindings
    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.slots.associations()
    }

    /// Slot showing `id`, if any
    pub fn assigned_slot(&self, id: OperationId) -> Option<SlotId> {
        self.slots.slot_of(id)
    }

    pub fn assigned_count(&self) -> usize {
        self.slots.assigned_count()
    }

    pub fn unused_slots(&self) -> &[SlotId] {
        self.slots.unused()
    }

    /// Operations waiting for a slot, longest waiting first
    pub fn unassigned(&self) -> Vec<OperationId> {
        self.slots.unassigned().collect()
    }

    pub fn operations(&self) -> &ProgressOperations {
        &self.operations
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn listener(&self) -> &D {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut D {
        &mut self.listener
    }

    /// Split into downstream listener and surface
    pub fn into_parts(self) -> (D, S) {
        (self.listener, self.surface)
    }

    fn apply(&mut self, event: &OutputEvent) {
        match event {
            OutputEvent::ProgressStart(start) => {
                self.surface.set_visible(true);
                self.operations.start(
                    start.description.clone(),
                    start.status.clone(),
                    start.category.clone(),
                    start.id,
                    start.parent_id,
                );
                self.slots
                    .attach(start.id, &self.operations, &mut self.surface, &self.layout);
            }
            OutputEvent::ProgressComplete(complete) => {
                if let Some(op) = self.operations.complete(complete.id) {
                    self.slots
                        .detach(&op, &self.operations, &mut self.surface, &self.layout);
                }
            }
            OutputEvent::Progress(progress) => {
                self.operations.progress(progress.status.clone(), progress.id);
            }
            OutputEvent::End { .. } => self.surface.set_visible(false),
            OutputEvent::Log(_) | OutputEvent::Flush { .. } => {}
        }
    }
}

impl<D, S, L> OutputEventListener for WorkInProgressRenderer<D, S, L>
where
    D: OutputEventListener,
    S: RenderSurface,
    L: LayoutPolicy,
{
    fn on_output(&mut self, event: OutputEvent) {
        self.apply(&event);
        self.listener.on_output(event);
    }
}

impl<D, S, L> BatchOutputEventListener for WorkInProgressRenderer<D, S, L>
where
    D: OutputEventListener,
    S: RenderSurface,
    L: LayoutPolicy,
{
    /// Process a batch, then render once
    ///
    /// Operations that both start and complete inside the batch are never
    /// shown: their events go straight downstream, in their original order.
    fn on_batch(&mut self, events: Vec<OutputEvent>) {
        let completed: HashSet<OperationId> = events
            .iter()
            .filter_map(|event| match event {
                OutputEvent::ProgressComplete(complete) => Some(complete.id),
                _ => None,
            })
            .collect();
        let mut skipped: HashSet<OperationId> = HashSet::new();

        for event in events {
            let forward_only = match &event {
                OutputEvent::ProgressStart(start) if completed.contains(&start.id) => {
                    skipped.insert(start.id);
                    true
                }
                OutputEvent::Progress(progress) => skipped.contains(&progress.id),
                OutputEvent::ProgressComplete(complete) => skipped.contains(&complete.id),
                _ => false,
            };

            if forward_only {
                self.listener.on_output(event);
            } else {
                self.on_output(event);
            }
        }

        if !skipped.is_empty() {
            trace!(count = skipped.len(), "Operations started and finished within one batch");
        }
        self.render_now();
    }
}
