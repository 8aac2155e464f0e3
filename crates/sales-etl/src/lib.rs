//! Sales Data ETL Library
//!
//! Loads a sales-records CSV export, normalizes it, and replaces a SQLite
//! table with the result. The stored table can be read back and browsed in a
//! sortable text grid.
//!
//! # Overview
//!
//! - **Loading**: decoding legacy encodings and parsing delimited text
//! - **Cleaning**: date parsing, missing-value fills, a derived `TOTALVALUE`
//!   column and removal of incomplete rows
//! - **Storage**: full table replacement in one transaction
//! - **Viewing**: read-back with per-column ascending/descending sorting
//! - **Stage Reporting**: progress updates from the orchestrating pipeline
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_etl::{EtlConfig, EtlPipeline, GridView, fetch_table};
//!
//! let config = EtlConfig::builder()
//!     .input_path("sales_data_sample.csv")
//!     .connection_string("sqlite:///example.db")
//!     .build()?;
//!
//! let report = EtlPipeline::builder().config(config).build()?.run();
//! println!("saved: {}", report.summary.saved);
//!
//! let mut grid = GridView::new(fetch_table("sqlite:///example.db", "sales_data")?);
//! grid.click_header("SALES")?;
//! println!("{}", grid.render(Some(20)));
//! ```
//!
//! Each stage is also usable on its own:
//!
//! ```rust,ignore
//! let raw = sales_etl::load_csv("sales.csv", "latin1")?;
//! let outcome = sales_etl::clean(raw)?;
//! let saved = sales_etl::save(&outcome.data, "sqlite:///example.db", "sales_data");
//! ```

pub mod cleaner;
pub mod columns;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod logging;
pub mod pipeline;
pub mod sink;
pub mod types;
pub mod utils;
pub mod viewer;

// Re-exports for convenient access
pub use cleaner::{CleaningOutcome, SalesCleaner, clean, parse_datetime_str};
pub use config::{ConfigValidationError, EtlConfig, EtlConfigBuilder};
pub use error::{EtlError, Result as EtlResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use loader::load_csv;
pub use logging::{LoggingConfig, init_logging};
pub use pipeline::{
    ClosureStageReporter, EtlPipeline, EtlPipelineBuilder, PipelineStage, RunReport,
    StageReporter, StageUpdate,
};
pub use sink::{ConnectionTarget, SqliteSink, TableSink, fetch_snapshot, fetch_table, save};
pub use types::{CellValue, CleaningSummary, RunSummary, TableSnapshot};
pub use utils::{DtypeCategory, get_dtype_category, is_numeric_dtype, parse_numeric_coerce};
pub use viewer::{GridView, SortDirection, SortState, natural_cmp};
