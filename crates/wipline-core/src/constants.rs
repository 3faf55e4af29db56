//! Constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// Progress operation configuration
pub mod progress {
    /// Category of the top-level build progress operation.
    ///
    /// Lineage walks (renderability, formatting) stop at an operation carrying
    /// this category and never include it.
    pub const BUILD_PROGRESS_CATEGORY: &str = "build.progress";
}

/// Work-in-progress area rendering
pub mod render {
    /// Placeholder shown in slots that have no operation bound
    pub const IDLE_TEXT: &str = "> IDLE";

    /// Prefix of every formatted status line
    pub const LINE_PREFIX: &str = ">";

    /// Separator between messages of one operation lineage
    pub const LINEAGE_SEPARATOR: &str = " > ";

    /// Width used when the console does not report its column count
    pub const FALLBACK_WIDTH: usize = 80;
}

/// Console layout
pub mod layout {
    /// The progress area never claims more than `rows / ROWS_DIVISOR` lines
    pub const ROWS_DIVISOR: u16 = 2;

    /// Minimum number of work-in-progress slots, regardless of console height
    pub const MIN_SLOTS: usize = 1;
}

/// Event batching
pub mod throttle {
    use super::*;

    /// Default interval between batch deliveries
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);
}

/// Configuration file locations
pub mod config {
    /// Directory name under the platform config directory
    pub const CONFIG_DIR_NAME: &str = "wipline";

    /// Configuration file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}
