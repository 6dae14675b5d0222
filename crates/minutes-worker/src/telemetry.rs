//! Tracing subscriber setup.
//!
//! Environment variables:
//!   LOG_FORMAT  - "json" or "text" (default: "text")
//!   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
//!   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
//!   RUST_LOG    - standard env filter (default: [`DEFAULT_FILTER`])

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str =
    "minutes_worker=info,minutes_jobs=info,minutes_db=info,minutes_inference=info";

const DEFAULT_LOG_FILE_NAME: &str = "minutes-worker.log";

/// Logging options read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub json: bool,
    pub file: Option<String>,
    pub ansi: Option<bool>,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            file: std::env::var("LOG_FILE").ok().filter(|v| !v.is_empty()),
            ansi: std::env::var("LOG_ANSI").ok().map(|v| v == "true" || v == "1"),
        }
    }
}

/// Directory and file name for the rolling appender.
pub fn split_log_path(path: &str) -> (PathBuf, String) {
    let path = Path::new(path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let file = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(DEFAULT_LOG_FILE_NAME)
        .to_string();
    (dir, file)
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process when logging to a file.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = config.file {
        let (dir, file) = split_log_path(path);
        let file_appender = tracing_appender::rolling::daily(dir, file);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if config.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(config.ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if config.json {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = config.ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    }
}
