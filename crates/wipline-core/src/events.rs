//! Output events and the listener contracts that consume them
//!
//! Events describe the lifecycle of progress operations (start, progress,
//! complete) plus a few stream-level signals. Listeners consume them one at a
//! time or in ordered batches, and can be chained.

use std::fmt;
use std::io::BufRead;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WiplineError};

/// Identifies one progress operation for its whole lifetime
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub u64);

impl OperationId {
    /// Create an identifier from its raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationId({})", self.0)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A progress operation has started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStartEvent {
    pub id: OperationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<OperationId>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// A running operation reports a new status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub id: OperationId,
    pub status: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// An operation has finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressCompleteEvent {
    pub id: OperationId,
    /// Final status (e.g. "UP-TO-DATE"), relayed downstream only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Regular (non-progress) output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub category: String,
    pub message: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Everything that can travel through the output pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    ProgressStart(ProgressStartEvent),
    Progress(ProgressEvent),
    ProgressComplete(ProgressCompleteEvent),
    Log(LogEvent),
    /// Ask batching stages to deliver what they hold right away
    Flush {
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
    /// End of the output stream
    End {
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl OutputEvent {
    /// Start event for operation `id`
    pub fn start(
        id: OperationId,
        parent_id: Option<OperationId>,
        category: impl Into<String>,
        description: Option<&str>,
        status: Option<&str>,
    ) -> Self {
        Self::ProgressStart(ProgressStartEvent {
            id,
            parent_id,
            category: category.into(),
            description: description.map(str::to_string),
            status: status.map(str::to_string),
            timestamp: Utc::now(),
        })
    }

    /// Status update for operation `id`
    pub fn progress(id: OperationId, status: impl Into<String>) -> Self {
        Self::Progress(ProgressEvent {
            id,
            status: status.into(),
            timestamp: Utc::now(),
        })
    }

    /// Completion of operation `id`
    pub fn complete(id: OperationId) -> Self {
        Self::ProgressComplete(ProgressCompleteEvent {
            id,
            status: None,
            timestamp: Utc::now(),
        })
    }

    /// Plain log line
    pub fn log(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Log(LogEvent {
            category: category.into(),
            message: message.into(),
            timestamp: Utc::now(),
        })
    }

    pub fn flush() -> Self {
        Self::Flush {
            timestamp: Utc::now(),
        }
    }

    pub fn end() -> Self {
        Self::End {
            timestamp: Utc::now(),
        }
    }

    /// Operation this event refers to, for progress lifecycle events
    pub fn operation_id(&self) -> Option<OperationId> {
        match self {
            Self::ProgressStart(e) => Some(e.id),
            Self::Progress(e) => Some(e.id),
            Self::ProgressComplete(e) => Some(e.id),
            Self::Log(_) | Self::Flush { .. } | Self::End { .. } => None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ProgressStart(e) => e.timestamp,
            Self::Progress(e) => e.timestamp,
            Self::ProgressComplete(e) => e.timestamp,
            Self::Log(e) => e.timestamp,
            Self::Flush { timestamp } | Self::End { timestamp } => *timestamp,
        }
    }

    /// Whether a batching stage should deliver immediately after this event
    pub fn requires_flush(&self) -> bool {
        matches!(self, Self::Flush { .. } | Self::End { .. })
    }
}

/// Consumes output events one at a time
pub trait OutputEventListener {
    fn on_output(&mut self, event: OutputEvent);
}

/// Consumes ordered batches of output events
///
/// The default implementation hands each event of the batch to
/// [`OutputEventListener::on_output`] in order.
pub trait BatchOutputEventListener: OutputEventListener {
    fn on_batch(&mut self, events: Vec<OutputEvent>) {
        for event in events {
            self.on_output(event);
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl OutputEventListener for NullListener {
    fn on_output(&mut self, _event: OutputEvent) {}
}

impl BatchOutputEventListener for NullListener {}

/// Keeps every event it receives, in arrival order
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    /// All events seen so far
    pub events: Vec<OutputEvent>,
    /// Size of every batch delivered through `on_batch`
    pub batch_sizes: Vec<usize>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation ids of the recorded events (non-progress events skipped)
    pub fn operation_ids(&self) -> Vec<OperationId> {
        self.events.iter().filter_map(OutputEvent::operation_id).collect()
    }
}

impl OutputEventListener for EventRecorder {
    fn on_output(&mut self, event: OutputEvent) {
        self.events.push(event);
    }
}

impl BatchOutputEventListener for EventRecorder {
    fn on_batch(&mut self, events: Vec<OutputEvent>) {
        self.batch_sizes.push(events.len());
        self.events.extend(events);
    }
}

/// Decode one line of a JSON-lines event script
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_event_line(line: &str, line_no: usize) -> Result<Option<OutputEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| WiplineError::EventDecode {
            line: line_no,
            source,
        })
}

/// Decode a whole JSON-lines event script
pub fn read_events(reader: impl BufRead) -> Result<Vec<OutputEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(event) = parse_event_line(&line, idx + 1)? {
            events.push(event);
        }
    }
    Ok(events)
}
