//! Logging setup
//!
//! File-plus-stdout tracing output with local-time timestamps. Log files
//! live under `~/.hermes/logs`; the level is controlled through `RUST_LOG`
//! and defaults to `info`.

use anyhow::Context;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

/// Format timestamps using the system's local time via chrono
struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Directory the log file is written to (~/.hermes/logs)
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".hermes").join("logs"))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Initialise the global tracing subscriber.
///
/// Installs a stdout layer and an appending file layer. Call once at
/// startup; a second call fails because the global subscriber is already
/// set.
pub fn init() -> anyhow::Result<()> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("hermes.log"))
        .with_context(|| format!("opening log file in {}", dir.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::sync::Mutex::new(file))
        .with_timer(LocalTimer)
        .with_ansi(false);
    let stdout_layer = tracing_subscriber::fmt::layer().with_timer(LocalTimer);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_under_hermes() {
        let dir = log_dir();
        let dir_str = dir.to_string_lossy();
        assert!(dir_str.contains(".hermes") || dir_str.starts_with("/tmp"));
        assert!(dir_str.ends_with("logs") || dir_str.starts_with("/tmp"));
    }
}
