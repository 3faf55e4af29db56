//! Layout sizing policy
//!
//! Turns a desired number of work-in-progress slots into the number the
//! console can actually afford.

use std::cell::OnceCell;

use crate::config::LayoutConfig;
use crate::constants;

/// Decides how many slots the work-in-progress area may have
pub trait LayoutPolicy {
    /// Slots permitted when `desired` are wanted
    fn permitted_slot_count(&self, desired: usize) -> usize;
}

/// Console dimensions, zero when unknown
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleMetadata {
    pub cols: u16,
    pub rows: u16,
}

impl ConsoleMetadata {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

/// Sizes the area from the console height
///
/// The area may use at most half of the console rows, clamped into
/// `[min_slots, max_slots]`. The maximum is computed on first use and kept,
/// so answers stay consistent for the renderer's grow-only usage.
#[derive(Debug, Clone)]
pub struct ConsoleLayoutCalculator {
    metadata: ConsoleMetadata,
    min_slots: usize,
    max_slots: Option<usize>,
    maximum: OnceCell<usize>,
}

impl ConsoleLayoutCalculator {
    pub fn new(metadata: ConsoleMetadata, config: &LayoutConfig) -> Self {
        Self {
            metadata,
            min_slots: config.min_slots,
            max_slots: config.max_slots,
            maximum: OnceCell::new(),
        }
    }

    /// Most slots this console will ever be given
    pub fn maximum_slots(&self) -> usize {
        *self.maximum.get_or_init(|| {
            let by_rows = usize::from(self.metadata.rows / constants::layout::ROWS_DIVISOR);
            let capped = self.max_slots.map_or(by_rows, |max| by_rows.min(max));
            capped.max(self.min_slots)
        })
    }
}

impl LayoutPolicy for ConsoleLayoutCalculator {
    fn permitted_slot_count(&self, desired: usize) -> usize {
        desired.min(self.maximum_slots())
    }
}

/// Fixed upper bound, independent of the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLayout(pub usize);

impl LayoutPolicy for FixedLayout {
    fn permitted_slot_count(&self, desired: usize) -> usize {
        desired.min(self.0)
    }
}
