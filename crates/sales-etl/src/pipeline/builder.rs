//! The ETL pipeline and its builder.

use crate::cleaner::SalesCleaner;
use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use crate::loader::load_csv;
use crate::pipeline::progress::{ClosureStageReporter, PipelineStage, StageReporter, StageUpdate};
use crate::sink::{SqliteSink, TableSink, log_save_outcome};
use crate::types::RunSummary;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of [`EtlPipeline::run`].
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The cleaned table; `None` when loading or cleaning failed.
    pub cleaned: Option<DataFrame>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Whether a cleaned table was produced, regardless of the save.
    pub fn has_data(&self) -> bool {
        self.cleaned.is_some()
    }
}

/// Load, clean and save one sales file.
///
/// Use [`EtlPipeline::builder()`] to construct one.
///
/// ```rust,ignore
/// use sales_etl::{EtlConfig, EtlPipeline};
///
/// let report = EtlPipeline::builder()
///     .config(EtlConfig::default())
///     .build()?
///     .run();
///
/// if report.summary.saved {
///     println!("Data successfully updated in the SQL table.");
/// }
/// ```
pub struct EtlPipeline {
    config: EtlConfig,
    cleaner: SalesCleaner,
    sink: Arc<dyn TableSink>,
    stage_reporter: Option<Arc<dyn StageReporter>>,
}

impl EtlPipeline {
    pub fn builder() -> EtlPipelineBuilder {
        EtlPipelineBuilder::default()
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Run every stage once.
    ///
    /// A load or clean failure halts the run with no cleaned table. A save
    /// failure is recorded in the summary but the cleaned table is still
    /// returned. Nothing here panics or propagates; every outcome lands in
    /// the report.
    pub fn run(&self) -> RunReport {
        let started = Instant::now();
        let mut summary = RunSummary::new(
            self.config.input_path.display().to_string(),
            self.config.table_name.clone(),
        );

        info!("Starting sales data pipeline");
        self.report(StageUpdate::new(
            PipelineStage::Initializing,
            1.0,
            "Starting sales data pipeline",
        ));

        let cleaned = match self.load_and_clean(&mut summary) {
            Ok(df) => df,
            Err(e) => {
                warn!("Pipeline halted during {}", e.stage().display_name());
                summary.failed_stage = Some(e.stage());
                summary.error_code = Some(e.error_code().to_string());
                summary.error = Some(e.to_string());
                summary.duration_ms = elapsed_ms(started);
                self.report(StageUpdate::failed(e.to_string()));
                return RunReport {
                    cleaned: None,
                    summary,
                };
            }
        };

        self.report(StageUpdate::new(
            PipelineStage::Saving,
            0.0,
            format!("Saving to table '{}'", self.config.table_name),
        ));
        let outcome = self.sink.try_save(
            &cleaned,
            &self.config.connection_string,
            &self.config.table_name,
        );
        summary.saved = log_save_outcome(&self.config.table_name, &outcome);
        if let Err(e) = outcome {
            summary.failed_stage = Some(PipelineStage::Saving);
            summary.error_code = Some(e.error_code().to_string());
            summary.error = Some(e.to_string());
        }
        summary.success = summary.saved;
        summary.duration_ms = elapsed_ms(started);

        let message = if summary.saved {
            "Pipeline completed successfully"
        } else {
            "Pipeline completed; the table was not saved"
        };
        info!("{} in {} ms", message, summary.duration_ms);
        self.report(StageUpdate::complete(message).with_rows(cleaned.height()));

        RunReport {
            cleaned: Some(cleaned),
            summary,
        }
    }

    fn load_and_clean(&self, summary: &mut RunSummary) -> Result<DataFrame> {
        self.report(StageUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Reading {}", self.config.input_path.display()),
        ));
        let raw = load_csv(&self.config.input_path, &self.config.encoding)?;
        summary.rows_loaded = Some(raw.height());
        self.report(
            StageUpdate::new(PipelineStage::Loading, 1.0, "Data loaded").with_rows(raw.height()),
        );

        self.report(StageUpdate::new(
            PipelineStage::Cleaning,
            0.0,
            "Cleaning sales records",
        ));
        let outcome = self.cleaner.clean(raw)?;
        self.report(
            StageUpdate::new(PipelineStage::Cleaning, 1.0, "Data cleaned")
                .with_rows(outcome.data.height()),
        );
        summary.cleaning = Some(outcome.summary);

        Ok(outcome.data)
    }

    fn report(&self, update: StageUpdate) {
        if let Some(reporter) = &self.stage_reporter {
            reporter.report(update);
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Builder for [`EtlPipeline`].
#[derive(Default)]
pub struct EtlPipelineBuilder {
    config: Option<EtlConfig>,
    sink: Option<Arc<dyn TableSink>>,
    stage_reporter: Option<Arc<dyn StageReporter>>,
}

impl EtlPipelineBuilder {
    pub fn config(mut self, config: EtlConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default [`SqliteSink`].
    pub fn sink(mut self, sink: Arc<dyn TableSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn stage_reporter(mut self, reporter: Arc<dyn StageReporter>) -> Self {
        self.stage_reporter = Some(reporter);
        self
    }

    /// Receive stage updates through a closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(StageUpdate) + Send + Sync + 'static,
    {
        self.stage_reporter = Some(Arc::new(ClosureStageReporter::new(callback)));
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<EtlPipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| EtlError::InvalidConfig(e.to_string()))?;

        Ok(EtlPipeline {
            config,
            cleaner: SalesCleaner,
            sink: self.sink.unwrap_or_else(|| Arc::new(SqliteSink)),
            stage_reporter: self.stage_reporter,
        })
    }
}
