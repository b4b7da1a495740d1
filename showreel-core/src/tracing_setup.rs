//! Logging for the Showreel binary
//!
//! Two sinks: the terminal at the level picked on the command line, and
//! `showreel-last-run.log` with everything down to `trace`. The file is
//! truncated on each start.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Name of the per-run trace file inside the logs directory.
pub const RUN_LOG_FILE: &str = "showreel-last-run.log";

/// Installs the global subscriber.
///
/// `RUST_LOG`, when set, replaces `console_level` for the terminal sink.
/// The file sink always records at `trace`. `logs_dir` defaults to `./logs`.
///
/// # Errors
///
/// - `std::io::Error` - If the logs directory or the trace file cannot be created
pub fn init_tracing(console_level: Level, logs_dir: Option<&Path>) -> Result<(), std::io::Error> {
    let log_path = run_log_path(logs_dir);
    if let Some(parent) = log_path.parent() {
        create_dir_all(parent)?;
    }
    let log_file = File::create(&log_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.as_str()));

    let terminal = fmt::layer()
        .with_target(true)
        .compact()
        .with_filter(console_filter);

    let run_log = fmt::layer()
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(terminal)
        .with(run_log)
        .init();

    tracing::info!(
        "Logging to terminal at {} and to {}",
        console_level,
        log_path.display()
    );

    Ok(())
}

fn run_log_path(logs_dir: Option<&Path>) -> PathBuf {
    logs_dir.unwrap_or_else(|| Path::new("logs")).join(RUN_LOG_FILE)
}

/// Terminal verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliLogLevel {
    /// Maps the flag value onto a `tracing` level.
    ///
    /// ```
    /// use showreel_core::tracing_setup::CliLogLevel;
    ///
    /// assert_eq!(CliLogLevel::Warn.as_tracing_level(), tracing::Level::WARN);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_tracing_level().as_str().to_lowercase())
    }
}
