//! A deliberately small logging setup: one global `tracing-subscriber`
//! layer, chosen and configured once at process startup. Library crates
//! never call `init` themselves — only the binary embedding the engine
//! does; a library crate installing a global subscriber behind an
//! application's back is a classic footgun.

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("failed to open log output file: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format for the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one event per line.
    Compact,
    /// Machine-parseable, one JSON object per line.
    Json,
}

/// Logging configuration, loaded as part of [`dagforge_config`]'s layered
/// config.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// An `EnvFilter` directive string, e.g. `"info"` or
    /// `"dagforge_scheduler=debug,info"`.
    pub filter: String,
    pub format: LogFormat,
    pub ansi: bool,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Compact,
            ansi: true,
            file: None,
        }
    }
}

/// Install the global `tracing` subscriber for the process. Call exactly
/// once, before any engine component emits its first span.
pub fn init_logging(config: LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let result = match (config.format, config.file) {
        (LogFormat::Json, Some(path)) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_ansi(false).with_writer(file))
                .try_init()
        }
        (LogFormat::Json, None) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_ansi(false))
            .try_init(),
        (LogFormat::Compact, Some(path)) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_ansi(false).with_writer(file))
                .try_init()
        }
        (LogFormat::Compact, None) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_ansi(config.ansi))
            .try_init(),
    };

    result.map_err(|_| LogError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_compact_format_with_info_filter() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn unwritable_log_file_path_reports_io_error_not_already_initialized() {
        let config = LogConfig {
            file: Some(PathBuf::from("/nonexistent-dir/does-not-exist/out.log")),
            ..LogConfig::default()
        };
        let err = init_logging(config).unwrap_err();
        assert!(matches!(err, LogError::Io(_)));
    }
}
