//! wipline Core - work-in-progress rendering for build console output
//!
//! This crate provides the pieces behind a live build progress area:
//! - Output events and listener contracts
//! - The tree of in-flight progress operations
//! - Slot allocation over a bounded, growable set of console lines
//! - The renderer that drives both from the event stream
//! - A throttled batching stage for multi-producer delivery

pub mod config;
pub mod console;
pub mod constants;
pub mod error;
pub mod events;
pub mod progress;
pub mod throttle;

// Re-exports for convenience
pub use config::WiplineConfig;
pub use console::{
    ConsoleLayoutCalculator, ConsoleMetadata, LayoutPolicy, RenderSurface, SlotId,
    WorkInProgressFormatter, WorkInProgressRenderer,
};
pub use error::{Result, WiplineError};
pub use events::{BatchOutputEventListener, OperationId, OutputEvent, OutputEventListener};
pub use progress::{ProgressOperation, ProgressOperations};
pub use throttle::{EventSender, ThrottledBatcher};
