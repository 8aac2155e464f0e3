//! Configuration types for the sales ETL pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! The defaults reproduce the fixed constants of a plain run: read
//! `sales_data_sample.csv` as latin1, write table `sales_data` into
//! `sqlite:///example.db` and log to `project.log`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default input file.
pub const DEFAULT_INPUT_PATH: &str = "sales_data_sample.csv";
/// Default input encoding label.
pub const DEFAULT_ENCODING: &str = "latin1";
/// Default storage connection string.
pub const DEFAULT_CONNECTION_STRING: &str = "sqlite:///example.db";
/// Default destination table.
pub const DEFAULT_TABLE_NAME: &str = "sales_data";
/// Default log file.
pub const DEFAULT_LOG_FILE: &str = "project.log";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for the ETL pipeline.
///
/// Use [`EtlConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sales_etl::config::EtlConfig;
///
/// let config = EtlConfig::builder()
///     .input_path("exports/sales.csv")
///     .table_name("sales_2003")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Delimited file to load.
    /// Default: "sales_data_sample.csv"
    pub input_path: PathBuf,

    /// Text encoding label of the input file (WHATWG label, e.g. "latin1", "utf-8").
    /// Default: "latin1"
    pub encoding: String,

    /// Connection string of the destination database.
    /// Default: "sqlite:///example.db"
    pub connection_string: String,

    /// Name of the destination table. Replaced on every run.
    /// Default: "sales_data"
    pub table_name: String,

    /// Append-only log file.
    /// Default: "project.log"
    pub log_file: PathBuf,

    /// Log level used when `RUST_LOG` is not set.
    /// Default: "info"
    pub log_level: String,

    /// Number of cleaned rows shown as a preview.
    /// Default: 5
    pub preview_rows: usize,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            encoding: DEFAULT_ENCODING.to_string(),
            connection_string: DEFAULT_CONNECTION_STRING.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: "info".to_string(),
            preview_rows: 5,
        }
    }
}

impl EtlConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EtlConfigBuilder {
        EtlConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !is_plain_identifier(&self.table_name) {
            return Err(ConfigValidationError::InvalidTableName(
                self.table_name.clone(),
            ));
        }

        if encoding_rs::Encoding::for_label(self.encoding.trim().as_bytes()).is_none() {
            return Err(ConfigValidationError::UnknownEncoding(self.encoding.clone()));
        }

        let level = self.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigValidationError::InvalidLogLevel(
                self.log_level.clone(),
            ));
        }

        if self.connection_string.trim().is_empty() {
            return Err(ConfigValidationError::EmptyConnectionString);
        }

        Ok(())
    }
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid table name '{0}' (expected letters, digits and underscores)")]
    InvalidTableName(String),

    #[error("Unknown encoding label '{0}'")]
    UnknownEncoding(String),

    #[error("Invalid log level '{0}' (expected one of trace, debug, info, warn, error)")]
    InvalidLogLevel(String),

    #[error("Connection string must not be empty")]
    EmptyConnectionString,
}

/// Builder for [`EtlConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EtlConfigBuilder {
    input_path: Option<PathBuf>,
    encoding: Option<String>,
    connection_string: Option<String>,
    table_name: Option<String>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    preview_rows: Option<usize>,
}

impl EtlConfigBuilder {
    /// Set the input file path.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the input encoding label.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the destination connection string.
    ///
    /// Accepts `sqlite:///relative.db`, `sqlite:////absolute.db`,
    /// `sqlite://` (in-memory) or a bare file path.
    pub fn connection_string(mut self, connection: impl Into<String>) -> Self {
        self.connection_string = Some(connection.into());
        self
    }

    /// Set the destination table name.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Set the log file path.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set the fallback log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Set how many cleaned rows to preview.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Build the configuration, using defaults for unset values.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<EtlConfig, ConfigValidationError> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration without validation.
    pub fn build_unchecked(self) -> EtlConfig {
        let defaults = EtlConfig::default();
        EtlConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            encoding: self.encoding.unwrap_or(defaults.encoding),
            connection_string: self.connection_string.unwrap_or(defaults.connection_string),
            table_name: self.table_name.unwrap_or(defaults.table_name),
            log_file: self.log_file.unwrap_or(defaults.log_file),
            log_level: self.log_level.unwrap_or(defaults.log_level),
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
        }
    }
}
