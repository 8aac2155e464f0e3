//! Pipeline module.
//!
//! Orchestrates load, clean and save, and reports progress along the way.

mod builder;
pub mod progress;

pub use builder::{EtlPipeline, EtlPipelineBuilder, RunReport};
pub use progress::{ClosureStageReporter, PipelineStage, StageReporter, StageUpdate};
