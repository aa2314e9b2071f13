//! # Runtime Control
//!
//! Operator-facing composition of the pipeline controller and the selection
//! registry: pause/resume, single-step with step detail, queue status, the
//! cognitive-state catalogue and provider administration.

pub mod facade;
pub mod processor_states;
pub mod responses;
pub mod sanitize;

pub use facade::{
    bootstrap, CognitiveStateSource, ControlPlane, PipelineControl, RuntimeControlService,
};
pub use processor_states::{processor_state_catalogue, CognitiveState, ProcessorStateInfo};
pub use responses::{ProcessorControlResponse, ProcessorStatus, QueueStatus, SingleStepResponse};
