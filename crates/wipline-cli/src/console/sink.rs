//! Downstream listener behind the renderer
//!
//! Log events become scrollback lines printed above the progress area.
//! Progress events are only traced; the renderer already shows them.

use tracing::{debug, trace};
use wipline_core::events::{BatchOutputEventListener, OutputEvent, OutputEventListener};

#[derive(Debug, Default)]
pub struct ConsoleSink {
    pending: Vec<String>,
    started: usize,
    completed: usize,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scrollback lines queued since the last call
    pub fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    pub fn started(&self) -> usize {
        self.started
    }

    pub fn completed(&self) -> usize {
        self.completed
    }
}

impl OutputEventListener for ConsoleSink {
    fn on_output(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::Log(log) => {
                self.pending.extend(log.message.lines().map(str::to_string));
            }
            OutputEvent::ProgressStart(start) => {
                self.started += 1;
                trace!(id = %start.id, parent = ?start.parent_id, category = %start.category, "start");
            }
            OutputEvent::Progress(progress) => {
                trace!(id = %progress.id, status = %progress.status, "progress");
            }
            OutputEvent::ProgressComplete(complete) => {
                self.completed += 1;
                trace!(id = %complete.id, status = ?complete.status, "complete");
            }
            OutputEvent::Flush { .. } => {}
            OutputEvent::End { .. } => {
                debug!(
                    started = self.started,
                    completed = self.completed,
                    "Output stream ended"
                );
            }
        }
    }
}

impl BatchOutputEventListener for ConsoleSink {}

#[cfg(test)]
mod tests {
    use super::*;
    use wipline_core::events::OperationId;

    #[test]
    fn test_log_lines_queue_for_scrollback() {
        let mut sink = ConsoleSink::new();
        sink.on_output(OutputEvent::log("build", "> Task :app:jar\nUP-TO-DATE"));
        sink.on_output(OutputEvent::progress(OperationId(1), "ignored"));

        assert_eq!(sink.take_pending(), vec!["> Task :app:jar", "UP-TO-DATE"]);
        assert!(sink.take_pending().is_empty());
    }

    #[test]
    fn test_counts_starts_and_completions() {
        let mut sink = ConsoleSink::new();
        sink.on_batch(vec![
            OutputEvent::start(OperationId(1), None, "task", Some(":a"), None),
            OutputEvent::start(OperationId(2), None, "task", Some(":b"), None),
            OutputEvent::complete(OperationId(1)),
        ]);

        assert_eq!(sink.started(), 2);
        assert_eq!(sink.completed(), 1);
    }
}
