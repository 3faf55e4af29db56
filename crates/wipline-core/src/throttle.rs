//! Throttled event batching
//!
//! Collects output events from any number of producers and hands them to a
//! single batch listener at a fixed interval. This is the serializing stage
//! the renderer expects in front of it: one consumer, ordered batches.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::config::ThrottleConfig;
use crate::error::Result;
use crate::events::{BatchOutputEventListener, OutputEvent};

/// Producer handle; clone freely
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<OutputEvent>,
}

impl EventSender {
    /// Queue an event. Returns `false` once the batcher has stopped.
    pub fn send(&self, event: OutputEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Single consumer that turns a stream of events into timed batches
#[derive(Debug)]
pub struct ThrottledBatcher {
    rx: mpsc::UnboundedReceiver<OutputEvent>,
    interval: Duration,
    queue: Vec<OutputEvent>,
    delivered: usize,
}

/// Create a batcher and the sender that feeds it
pub fn channel(config: &ThrottleConfig) -> (EventSender, ThrottledBatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    let batcher = ThrottledBatcher {
        rx,
        interval: config.interval(),
        // Pre-allocate for a typical burst of task events
        queue: Vec::with_capacity(64),
        delivered: 0,
    };
    (EventSender { tx }, batcher)
}

impl ThrottledBatcher {
    /// Deliver batches to `listener` until end-of-stream or until every
    /// sender is dropped
    pub async fn run<L>(self, listener: &mut L) -> Result<()>
    where
        L: BatchOutputEventListener,
    {
        self.run_with(listener, |_| Ok(())).await
    }

    /// Like [`run`](Self::run), calling `after_batch` once after every
    /// delivered batch; an error from the hook stops the loop
    pub async fn run_with<L, F>(mut self, listener: &mut L, mut after_batch: F) -> Result<()>
    where
        L: BatchOutputEventListener,
        F: FnMut(&mut L) -> Result<()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                received = self.rx.recv() => match received {
                    Some(event) => {
                        let flush = event.requires_flush();
                        let end = matches!(event, OutputEvent::End { .. });
                        self.queue.push(event);
                        if flush {
                            self.deliver(listener, &mut after_batch)?;
                        }
                        if end {
                            break;
                        }
                    }
                    None => {
                        self.deliver(listener, &mut after_batch)?;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.deliver(listener, &mut after_batch)?;
                }
            }
        }

        debug!(events = self.delivered, "Event batcher finished");
        Ok(())
    }

    fn deliver<L, F>(&mut self, listener: &mut L, after_batch: &mut F) -> Result<()>
    where
        L: BatchOutputEventListener,
        F: FnMut(&mut L) -> Result<()>,
    {
        if self.queue.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.queue);
        trace!(size = batch.len(), "Delivering event batch");
        self.delivered += batch.len();
        listener.on_batch(batch);
        after_batch(listener)
    }
}
