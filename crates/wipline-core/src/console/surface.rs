//! Render surface contract
//!
//! The surface owns the physical lines of the work-in-progress area. The
//! renderer only refers to them by [`SlotId`], the position of a line in the
//! surface's ordered slot list.

use std::fmt;

/// Position of one line in the work-in-progress area
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

impl SlotId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

/// Where work-in-progress lines end up
///
/// Calls are fire-and-forget from the renderer's point of view; how and when
/// text actually reaches the terminal is up to the implementation.
pub trait RenderSurface {
    /// Show or hide the whole work-in-progress area
    fn set_visible(&mut self, visible: bool);

    /// Number of slots currently available
    fn slot_count(&self) -> usize;

    /// Current slots, in display order
    fn slots(&self) -> Vec<SlotId> {
        (0..self.slot_count()).map(SlotId).collect()
    }

    /// Grow the area to `count` slots. Never called with a smaller count.
    fn grow_to(&mut self, count: usize);

    /// Replace the text of one slot
    fn set_text(&mut self, slot: SlotId, text: &str);
}

/// In-memory surface, for tests and headless runs
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    visible: bool,
    lines: Vec<String>,
    grow_history: Vec<usize>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface that starts out with `count` empty slots
    pub fn with_slots(count: usize) -> Self {
        Self {
            lines: vec![String::new(); count],
            ..Self::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self, slot: SlotId) -> Option<&str> {
        self.lines.get(slot.0).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Every size the surface was grown to, oldest first
    pub fn grow_history(&self) -> &[usize] {
        &self.grow_history
    }
}

impl RenderSurface for MemorySurface {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn slot_count(&self) -> usize {
        self.lines.len()
    }

    fn grow_to(&mut self, count: usize) {
        if count > self.lines.len() {
            self.lines.resize(count, String::new());
            self.grow_history.push(count);
        }
    }

    fn set_text(&mut self, slot: SlotId, text: &str) {
        if let Some(line) = self.lines.get_mut(slot.0) {
            line.clear();
            line.push_str(text);
        }
    }
}
