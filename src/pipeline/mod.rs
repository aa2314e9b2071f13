//! # Pipeline Step Control
//!
//! Thoughts move through five fixed stages. The [`PipelineStepController`]
//! tracks where each thought is and gates its advancement: free-running while
//! the pipeline is running, one stage per [`PipelineStepController::single_step`]
//! tick while paused.

pub mod controller;
pub mod error;
pub mod metrics;
pub mod state;
pub mod step_point;
pub mod step_result;

pub use controller::{
    PipelineStepController, SingleStepOutcome, StageProcessor, StepFailure, ThoughtProgress,
};
pub use error::{PipelineError, StageError};
pub(crate) use metrics::MetricsRecorder;
pub use metrics::ProcessingMetrics;
pub use state::{PipelineState, QueuedTask, QueuedThought, ThoughtInPipeline};
pub use step_point::StepPoint;
pub use step_result::{
    ActionCompleteResult, ConscienceExecutionResult, ConscienceVerdict, GatherContextResult,
    PerformAspdmaResult, PerformDmasResult, StepMetadata, StepResult,
};
