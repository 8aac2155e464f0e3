//! Custom error types for the sales ETL pipeline.
//!
//! Every stage reports failures through [`EtlError`]. The variants map one to
//! one onto the failure kinds the orchestrator branches on: input access
//! (load), transformation (clean) and storage (save / read-back).
//!
//! Errors are serializable so the CLI can emit them inside its JSON summary.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineStage;

/// The main error type for the ETL pipeline.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Input file does not exist.
    #[error("The file was not found at the specified path: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input file exists but holds no content.
    #[error("The file is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    /// Delimited content could not be parsed into a table.
    #[error("There was an error parsing the data: {0}")]
    MalformedContent(String),

    /// Bytes could not be decoded with the requested encoding.
    #[error("An encoding error occurred ({encoding}): {reason}")]
    Encoding { encoding: String, reason: String },

    /// Any other failure while reading the input.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),

    /// A required column is missing from the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Column could not be converted to the type a step requires.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// Connection target is not a storage backend we can write to.
    #[error("Unsupported connection target: {0}")]
    UnsupportedTarget(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// SQLite error wrapper.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EtlError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, used in the JSON summary.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::EmptyFile(_) => "EMPTY_FILE",
            Self::MalformedContent(_) => "MALFORMED_CONTENT",
            Self::Encoding { .. } => "ENCODING_ERROR",
            Self::Unexpected(_) => "UNEXPECTED_ERROR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::UnsupportedTarget(_) => "UNSUPPORTED_TARGET",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The pipeline stage this kind of error originates from.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::FileNotFound(_)
            | Self::EmptyFile(_)
            | Self::MalformedContent(_)
            | Self::Encoding { .. }
            | Self::Unexpected(_) => PipelineStage::Loading,
            Self::ColumnNotFound(_) | Self::TypeConversionFailed { .. } | Self::Polars(_) => {
                PipelineStage::Cleaning
            }
            Self::UnsupportedTarget(_) | Self::Storage(_) => PipelineStage::Saving,
            Self::InvalidConfig(_) => PipelineStage::Initializing,
            Self::WithContext { source, .. } => source.stage(),
        }
    }

    /// Check if this error is an input-access failure (fatal to the run).
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::WithContext { source, .. } => source.is_input_error(),
            Self::FileNotFound(_)
            | Self::EmptyFile(_)
            | Self::MalformedContent(_)
            | Self::Encoding { .. }
            | Self::Unexpected(_) => true,
            _ => false,
        }
    }
}

/// Errors are serialized as `{ "code": ..., "message": ... }`.
impl Serialize for EtlError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EtlError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for ETL operations.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EtlError::Polars(e).with_context(context))
    }
}
