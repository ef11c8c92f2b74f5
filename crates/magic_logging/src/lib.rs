//! Shared logging utilities for MagIC binaries.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "magic=info,magic_contribution=info";

/// Console filter when not running verbose. Diagnostics are printed by the
/// commands themselves, so only real failures go to stderr.
const QUIET_CONSOLE_FILTER: &str = "error";

/// Logging configuration shared by MagIC binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Filter from config.toml; `RUST_LOG` still wins
    pub filter: Option<&'a str>,
}

/// Initialize tracing with a daily rolling file under the logs directory and
/// stderr output.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process. File logging is skipped (with a note on stderr)
/// when the logs directory cannot be created.
pub fn init_logging(config: LogConfig<'_>) -> Result<Option<WorkerGuard>> {
    let file_filter = resolve_filter(std::env::var("RUST_LOG").ok().as_deref(), config.filter);
    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        QUIET_CONSOLE_FILTER.to_string()
    };

    let mut guard = None;
    let file_layer = match ensure_logs_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(
                dir,
                format!("{}.log", sanitize_name(config.app_name)),
            );
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(EnvFilter::new(&file_filter)),
            )
        }
        Err(err) => {
            eprintln!("Warning: file logging disabled: {:#}", err);
            None
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(console_filter)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Pick the log filter: `RUST_LOG`, then the configured filter, then the default.
pub fn resolve_filter(env: Option<&str>, configured: Option<&str>) -> String {
    env.filter(|f| !f.trim().is_empty())
        .or(configured.filter(|f| !f.trim().is_empty()))
        .unwrap_or(DEFAULT_LOG_FILTER)
        .to_string()
}

/// Get the MagIC home directory.
///
/// Priority:
/// 1) MAGIC_HOME
/// 2) ~/.magic
/// 3) ./.magic
pub fn magic_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("MAGIC_HOME") {
        if !override_path.is_empty() {
            return PathBuf::from(override_path);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".magic")
}

/// Get the logs directory: ~/.magic/logs
pub fn logs_dir() -> PathBuf {
    magic_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_priority() {
        assert_eq!(resolve_filter(Some("debug"), Some("warn")), "debug");
        assert_eq!(resolve_filter(None, Some("warn")), "warn");
        assert_eq!(resolve_filter(Some("  "), None), DEFAULT_LOG_FILTER);
        assert_eq!(resolve_filter(None, None), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("magic"), "magic");
        assert_eq!(sanitize_name("magic cli/v2"), "magic_cli_v2");
    }
}
