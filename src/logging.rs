//! Log subscriber setup.
//!
//! The filter comes from `STICKWAR_LOG` (default `info`). Interactive
//! sessions own the terminal, so they only log when `STICKWAR_LOG_FILE`
//! names a file; headless commands log to stderr.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

pub const FILTER_ENV: &str = "STICKWAR_LOG";
pub const FILE_ENV: &str = "STICKWAR_LOG_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// Append to `STICKWAR_LOG_FILE`, or stay silent if it is unset.
    File,
    Stderr,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(sink: Sink) -> Result<()> {
    match sink {
        Sink::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("failed to install log subscriber: {e}")),
        Sink::File => {
            let Some(path) = std::env::var_os(FILE_ENV) else {
                return Ok(());
            };
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.to_string_lossy()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
        }
    }
}
