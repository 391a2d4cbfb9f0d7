//! Tracing subscriber setup for the binary
//!
//! The library only emits events; whoever embeds it owns the subscriber.

use crate::output::OutputMode;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Default filter directive for an output mode. `RUST_LOG` overrides it.
pub fn default_directive(mode: OutputMode) -> &'static str {
    match mode {
        OutputMode::Quiet => "error",
        OutputMode::Normal => "warn",
        OutputMode::Verbose => "info",
        OutputMode::VeryVerbose => "debug",
    }
}

/// Install the global subscriber: stderr always, plus `log_file` when set.
///
/// The file layer records at `info` or the console level, whichever is more
/// detailed, and never writes ANSI escapes.
pub fn init(mode: OutputMode, log_file: Option<&Path>) -> Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(mode)));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            let directive = match mode {
                OutputMode::VeryVerbose => "debug",
                _ => "info",
            };
            let file_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive));
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_follows_verbosity() {
        assert_eq!(default_directive(OutputMode::Quiet), "error");
        assert_eq!(default_directive(OutputMode::Normal), "warn");
        assert_eq!(default_directive(OutputMode::Verbose), "info");
        assert_eq!(default_directive(OutputMode::VeryVerbose), "debug");
    }
}
