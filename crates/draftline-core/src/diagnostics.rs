use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub const DEFAULT_LOG_FILTER: &str = "info,draftline_core=debug";
pub const DEFAULT_FILE_PREFIX: &str = "draftline";

/// `[diagnostics]` section of the application config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Used when `RUST_LOG` is unset.
    pub rust_log_filter: String,
    pub log_dir: PathBuf,
    pub trace_file_prefix: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            rust_log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: PathBuf::from("logs"),
            trace_file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl DiagnosticsConfig {
    #[must_use]
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    /// `<prefix>-<YYYYMMDD-HHMMSS>.log`
    #[must_use]
    pub fn log_file_name(&self, started: DateTime<Utc>) -> String {
        format!(
            "{}-{}.log",
            self.trace_file_prefix,
            started.format("%Y%m%d-%H%M%S")
        )
    }

    /// `RUST_LOG` when set, else the configured filter. A filter that does
    /// not parse falls back to the built-in default.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.rust_log_filter))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Keeps the file writer flushing until dropped.
pub struct TelemetryGuard {
    pub session_id: Uuid,
    pub log_path: PathBuf,
    _file_guard: WorkerGuard,
}

/// Human-readable events on stderr (stdout carries command output) and
/// JSON events in a per-session file under the configured log directory.
pub fn init_tracing(config: &DiagnosticsConfig) -> anyhow::Result<TelemetryGuard> {
    let log_dir: &Path = &config.log_dir;
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let session_id = Uuid::new_v4();
    let file_name = config.log_file_name(Utc::now());
    let log_path = log_dir.join(&file_name);
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true)
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(file_writer);

    if let Err(error) = tracing_subscriber::registry()
        .with(config.env_filter())
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        warn!(?error, "global tracing subscriber already initialized");
    } else {
        info!(%session_id, log_path = %log_path.display(), "tracing initialized");
    }

    Ok(TelemetryGuard {
        session_id,
        log_path,
        _file_guard: file_guard,
    })
}
