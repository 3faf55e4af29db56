//! Configuration
//!
//! Loaded from TOML. Every field has a default, so an empty or missing file
//! is a valid configuration.
//!
//! ```toml
//! [render]
//! idle_text = "> IDLE"
//!
//! [layout]
//! min_slots = 1
//! max_slots = 8
//!
//! [throttle]
//! interval_ms = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, WiplineError};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiplineConfig {
    pub render: RenderConfig,
    pub layout: LayoutConfig,
    pub throttle: ThrottleConfig,
}

/// Status line rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Text shown in slots with no operation
    pub idle_text: String,
    /// Console width override; the terminal is asked when unset
    pub width: Option<u16>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            idle_text: constants::render::IDLE_TEXT.to_string(),
            width: None,
        }
    }
}

/// Bounds on the number of work-in-progress slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Slots granted even on a tiny console
    pub min_slots: usize,
    /// Hard cap on top of the console-height limit
    pub max_slots: Option<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_slots: constants::layout::MIN_SLOTS,
            max_slots: None,
        }
    }
}

/// Event batching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Milliseconds between batch deliveries
    pub interval_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            interval_ms: constants::throttle::DEFAULT_INTERVAL.as_millis() as u64,
        }
    }
}

impl ThrottleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl WiplineConfig {
    /// Default config file location (`<config dir>/wipline/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::config::CONFIG_DIR_NAME)
                .join(constants::config::CONFIG_FILE_NAME)
        })
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| WiplineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| WiplineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, otherwise the default file when it exists,
    /// otherwise defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.throttle.interval_ms == 0 {
            return Err(WiplineError::InvalidConfig(
                "throttle.interval_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(max) = self.layout.max_slots {
            if max < self.layout.min_slots {
                return Err(WiplineError::InvalidConfig(format!(
                    "layout.max_slots ({}) is smaller than layout.min_slots ({})",
                    max, self.layout.min_slots
                )));
            }
        }
        Ok(())
    }
}
