//! Work-in-progress console area
//!
//! Everything between the operation tree and the terminal: slot allocation,
//! layout sizing, status line formatting and the renderer that ties them to
//! the output event stream.

mod formatter;
mod layout;
mod renderer;
mod renderer_tests;
mod slots;
mod surface;

pub use formatter::{truncate_to_width, WorkInProgressFormatter};
pub use layout::{ConsoleLayoutCalculator, ConsoleMetadata, FixedLayout, LayoutPolicy};
pub use renderer::WorkInProgressRenderer;
pub use slots::{Association, SlotPool};
pub use surface::{MemorySurface, RenderSurface, SlotId};
