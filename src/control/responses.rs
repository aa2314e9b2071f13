use crate::constants::status;
use crate::pipeline::{PipelineState, ProcessingMetrics, StepFailure, StepPoint};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorStatus {
    Running,
    Paused,
}

impl ProcessorStatus {
    pub fn from_paused(is_paused: bool) -> Self {
        if is_paused {
            Self::Paused
        } else {
            Self::Running
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => status::RUNNING,
            Self::Paused => status::PAUSED,
        }
    }
}

impl fmt::Display for ProcessorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of pause or resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorControlResponse {
    pub success: bool,
    pub processor_name: String,
    pub operation: String,
    pub new_status: ProcessorStatus,
    pub message: String,
    pub error: Option<String>,
}

/// Composite single-step response. Payload fields are always present and are
/// `null` when unavailable or when they failed boundary validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleStepResponse {
    pub success: bool,
    pub message: String,
    pub processor_name: String,
    pub processor_status: ProcessorStatus,
    pub cognitive_state: Option<String>,
    pub queue_depth: usize,
    pub round_number: Option<u64>,
    pub steps_processed: usize,
    pub step_point: Option<StepPoint>,
    pub step_result: Option<Value>,
    pub results_by_round: BTreeMap<u64, Vec<Value>>,
    pub failures: Vec<StepFailure>,
    pub pipeline_state: Option<PipelineState>,
    pub processing_metrics: Option<ProcessingMetrics>,
    pub processing_time_ms: Option<f64>,
    pub tokens_used: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub processor_name: String,
    pub queue_size: usize,
    pub max_size: usize,
    /// Seconds per thought
    pub processing_rate: f64,
    pub average_latency_ms: f64,
    pub oldest_message_age_seconds: Option<f64>,
}
