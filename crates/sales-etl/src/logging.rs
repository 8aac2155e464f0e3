//! Process-wide logging setup.
//!
//! Every notable event goes to one append-only log file as a line with a
//! timestamp, level and message. Warnings and errors can additionally be
//! mirrored to stderr.

use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Keeps the background writer alive for the life of the process.
static GUARD: OnceCell<WorkerGuard> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_file: PathBuf,
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Mirror warnings and errors to stderr.
    pub console: bool,
}

impl LoggingConfig {
    pub fn new(log_file: impl Into<PathBuf>, level: impl Into<String>) -> Self {
        Self {
            log_file: log_file.into(),
            level: level.into(),
            console: true,
        }
    }

    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }
}

/// Log destination and level taken from a run configuration.
impl From<&EtlConfig> for LoggingConfig {
    fn from(config: &EtlConfig) -> Self {
        Self::new(&config.log_file, &config.log_level)
    }
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    GUARD
        .get_or_try_init(|| install(config))
        .map(|_| ())
}

fn install(config: &LoggingConfig) -> Result<WorkerGuard> {
    let (dir, file_name) = split_log_path(&config.log_file)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| EtlError::InvalidConfig(format!("cannot open log file: {}", e)))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);

    let console_layer = config.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| EtlError::InvalidConfig(format!("logging already configured: {}", e)))?;

    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            EtlError::InvalidConfig(format!("invalid log file path: {}", path.display()))
        })?
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("project.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "project.log");

        let (dir, name) = split_log_path(Path::new("/var/log/etl/run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/etl"));
        assert_eq!(name, "run.log");

        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::new("project.log", "debug").console(false);
        assert_eq!(config.level, "debug");
        assert!(!config.console);
    }

    #[test]
    fn test_from_etl_config() {
        let etl = EtlConfig::builder()
            .log_file("logs/etl.log")
            .log_level("warn")
            .build()
            .unwrap();

        let config = LoggingConfig::from(&etl).console(false);
        assert_eq!(config.log_file, PathBuf::from("logs/etl.log"));
        assert_eq!(config.level, "warn");
        assert!(!config.console);

        let defaults = LoggingConfig::from(&EtlConfig::default());
        assert_eq!(defaults.log_file, PathBuf::from("project.log"));
        assert_eq!(defaults.level, "info");
        assert!(defaults.console);
    }
}
