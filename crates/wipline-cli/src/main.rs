//! wipline - live work-in-progress console for parallel build output
//!
//! Shows the most specific running operations of a build in a small block
//! of lines under the regular log output:
//! - `demo` simulates a parallel build
//! - `replay` plays a recorded JSON-lines event script

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use wipline_core::{constants, WiplineConfig};

mod console;

use console::{demo, Source};

/// wipline - build progress console
#[derive(Parser)]
#[command(name = "wipline")]
#[command(about = "Live work-in-progress console for parallel build output", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file (defaults to the platform data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a parallel build
    Demo {
        /// Concurrent workers
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Number of tasks in the build
        #[arg(short, long, default_value_t = 40)]
        tasks: usize,

        /// Seed for the generated build
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
    },

    /// Replay a JSON-lines event script
    Replay {
        file: PathBuf,

        /// Pause between events
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
}

/// Give the cursor back and drop any half-drawn line
fn restore_terminal() {
    use crossterm::{cursor::Show, execute, style::Print};
    let _ = execute!(std::io::stdout(), Show, Print("\r\n"));
}

fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(constants::config::CONFIG_DIR_NAME)
        .join("wipline.log")
}

/// Log to a file: the terminal belongs to the progress area
fn init_logging(path: &Path) {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).ok();
    }

    #[cfg(unix)]
    let null_device = "/dev/null";
    #[cfg(windows)]
    let null_device = "NUL";

    let Ok(log_file) =
        std::fs::File::create(path).or_else(|_| std::fs::File::create(null_device))
    else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up panic hook to restore terminal state
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path);

    let config = WiplineConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    tracing::info!(?config, "Configuration loaded");

    let source = match cli.command {
        Commands::Demo {
            workers,
            tasks,
            seed,
        } => Source::Demo {
            plan: demo::plan_build(tasks, seed),
            workers,
        },
        Commands::Replay { file, delay_ms } => Source::Replay {
            file,
            delay: Duration::from_millis(delay_ms),
        },
    };

    console::app::run(&config, source).await
}
