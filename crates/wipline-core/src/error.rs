//! Error types for the fallible edges of wipline
//!
//! Event processing itself never fails; these cover configuration, event
//! decoding and terminal I/O.

use std::path::PathBuf;

use thiserror::Error;

/// wipline error type
#[derive(Debug, Error)]
pub enum WiplineError {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the config schema
    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration parsed but holds unusable values
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A line of an event script is not a valid output event
    #[error("invalid event on line {line}: {source}")]
    EventDecode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias used across wipline-core
pub type Result<T> = std::result::Result<T, WiplineError>;
