//! Pipeline wiring: producer -> batcher -> renderer -> sink, with the
//! terminal surface presented after every batch

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use wipline_core::console::{
    ConsoleLayoutCalculator, ConsoleMetadata, WorkInProgressFormatter, WorkInProgressRenderer,
};
use wipline_core::{throttle, WiplineConfig};

use super::demo::{self, TaskPlan};
use super::replay;
use super::sink::ConsoleSink;
use super::terminal::TerminalSurface;

type ConsoleRenderer =
    WorkInProgressRenderer<ConsoleSink, TerminalSurface<Stdout>, ConsoleLayoutCalculator>;

/// Where events come from
pub enum Source {
    Demo { plan: Vec<TaskPlan>, workers: usize },
    Replay { file: PathBuf, delay: Duration },
}

pub async fn run(config: &WiplineConfig, source: Source) -> Result<()> {
    let mut renderer = build_renderer(config);
    let (sender, batcher) = throttle::channel(&config.throttle);

    let producer = match source {
        Source::Demo { plan, workers } => tokio::spawn(demo::run(plan, workers, sender)),
        Source::Replay { file, delay } => {
            let events = replay::load_script(&file)?;
            tokio::spawn(replay::play(events, delay, sender))
        }
    };

    let result = tokio::select! {
        result = batcher.run_with(&mut renderer, |renderer| {
            let pending = renderer.listener_mut().take_pending();
            renderer.surface_mut().present(&pending)?;
            Ok(())
        }) => result.context("Rendering failed"),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };

    let pending = renderer.listener_mut().take_pending();
    renderer
        .surface_mut()
        .finish(&pending)
        .context("Failed to clear the progress area")?;

    if !producer.is_finished() {
        producer.abort();
    } else if let Err(e) = producer.await {
        warn!("Event producer failed: {}", e);
    }

    let sink = renderer.listener();
    info!(
        started = sink.started(),
        completed = sink.completed(),
        "Console finished"
    );
    result
}

fn build_renderer(config: &WiplineConfig) -> ConsoleRenderer {
    let (term_cols, rows) = crossterm::terminal::size().unwrap_or_else(|e| {
        warn!("Could not query terminal size: {}", e);
        (0, 0)
    });
    let cols = config.render.width.unwrap_or(term_cols);
    let metadata = ConsoleMetadata::new(cols, rows);
    let layout = ConsoleLayoutCalculator::new(metadata, &config.layout);
    info!(
        cols,
        rows,
        max_slots = layout.maximum_slots(),
        "Console layout"
    );

    let formatter = WorkInProgressFormatter::new(cols, config.render.idle_text.clone());
    let surface = TerminalSurface::new(io::stdout(), formatter.idle());
    WorkInProgressRenderer::new(ConsoleSink::new(), surface, formatter, layout)
}
