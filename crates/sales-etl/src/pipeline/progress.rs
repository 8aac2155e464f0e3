//! Stage reporting for the ETL pipeline.
//!
//! The pipeline emits a [`StageUpdate`] when each stage starts and finishes.
//! Callers observe them through a [`StageReporter`], or through a closure
//! passed to [`EtlPipelineBuilder::on_progress`](super::EtlPipelineBuilder::on_progress).
//!
//! ```rust,ignore
//! let report = EtlPipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run();
//! ```

use serde::{Deserialize, Serialize};

/// Stages of an ETL run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Validating configuration
    Initializing,
    /// Reading and decoding the input file
    Loading,
    /// Normalizing the loaded table
    Cleaning,
    /// Replacing the destination table
    Saving,
    /// Run finished; the save may still have failed
    Complete,
    /// Run halted before the save stage
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Loading => "Loading Data",
            Self::Cleaning => "Cleaning Data",
            Self::Saving => "Saving Data",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run spent in this stage.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.05,
            Self::Loading => 0.35,
            Self::Cleaning => 0.30,
            Self::Saving => 0.30,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::Loading => 0.05,
            Self::Cleaning => 0.40,
            Self::Saving => 0.70,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress event emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageUpdate {
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    /// Table height at this point, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
}

impl StageUpdate {
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            rows: None,
        }
    }

    /// Attach the current row count.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
            rows: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
            rows: None,
        }
    }
}

/// Receiver for [`StageUpdate`]s.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved to a
/// worker thread.
pub trait StageReporter: Send + Sync {
    fn report(&self, update: StageUpdate);
}

/// [`StageReporter`] backed by a closure.
pub struct ClosureStageReporter<F>
where
    F: Fn(StageUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureStageReporter<F>
where
    F: Fn(StageUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StageReporter for ClosureStageReporter<F>
where
    F: Fn(StageUpdate) + Send + Sync,
{
    fn report(&self, update: StageUpdate) {
        (self.callback)(update);
    }
}
