//! Tracing setup: stdout plus an append-only log file.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "homework_bot=info,telegram=info";

pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Build the subscriber. Lines carry timestamp, level, target and fields;
/// the file copy is written without ANSI colours.
pub fn subscriber(filter: EnvFilter, log_file: Option<File>) -> impl Subscriber + Send + Sync + 'static {
    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
}

/// Install the global subscriber. `RUST_LOG` overrides [`DEFAULT_FILTER`].
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let file = log_file.map(open_log_file).transpose()?;

    subscriber(filter, file)
        .try_init()
        .context("Failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        fs::write(&path, "earlier run\n").unwrap();

        {
            use std::io::Write;
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "this run").unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier run\nthis run\n");
    }

    #[test]
    fn test_events_reach_log_file_without_colours() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let file = open_log_file(&path).unwrap();

        let sub = subscriber(EnvFilter::new("homework_bot=info"), Some(file));
        tracing::subscriber::with_default(sub, || {
            tracing::info!(target: "homework_bot::poller", watermark = 1000, "Homework poller started");
            tracing::debug!(target: "homework_bot::poller", "filtered out");
        });

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("INFO"));
        assert!(text.contains("homework_bot::poller"));
        assert!(text.contains("Homework poller started"));
        assert!(text.contains("watermark=1000"));
        assert!(!text.contains("filtered out"));
        assert!(!text.contains('\u{1b}'));
    }
}
