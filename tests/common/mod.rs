#![allow(dead_code)]

pub mod mock_processor;
pub mod strategies;

pub use mock_processor::*;
pub use strategies::*;

use runtime_control::config::{PipelineSettings, RuntimeControlConfig};
use runtime_control::control::{bootstrap, ControlPlane};
use runtime_control::pipeline::{PipelineStepController, StepPoint, ThoughtInPipeline};
use std::sync::Arc;

/// Thought already positioned at `step`
pub fn thought_at(thought_id: &str, step: StepPoint) -> ThoughtInPipeline {
    let mut thought = ThoughtInPipeline::new(thought_id, "task-1", "standard");
    thought.current_step = step;
    thought
}

pub fn controller_with(processor: Arc<ScriptedStageProcessor>) -> PipelineStepController {
    PipelineStepController::new(processor, PipelineSettings::default())
}

pub fn control_plane(
    config: &RuntimeControlConfig,
    processor: Arc<ScriptedStageProcessor>,
) -> ControlPlane {
    bootstrap(config, processor).expect("bootstrap control plane")
}
