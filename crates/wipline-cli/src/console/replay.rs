//! Replay of recorded event scripts
//!
//! A script is a JSON-lines file of output events, one per line. Blank lines
//! and `#` comments are skipped.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;
use wipline_core::events::{read_events, OutputEvent};
use wipline_core::EventSender;

/// Read every event of the script at `path`
pub fn load_script(path: &Path) -> Result<Vec<OutputEvent>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let events = read_events(BufReader::new(file))
        .with_context(|| format!("Failed to read events from {}", path.display()))?;
    info!(events = events.len(), path = %path.display(), "Loaded event script");
    Ok(events)
}

/// Send `events` in order, pausing `delay` between them
///
/// An end-of-stream event is appended when the script has none.
pub async fn play(events: Vec<OutputEvent>, delay: Duration, sender: EventSender) {
    let mut ended = false;
    for event in events {
        ended = matches!(event, OutputEvent::End { .. });
        if !sender.send(event) || ended {
            break;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    if !ended {
        sender.send(OutputEvent::end());
    }
}
