//! Stage result payloads, one variant per [`StepPoint`].
//!
//! The control plane records these; it does not interpret DMA internals. DMA
//! outcomes arrive from the cognitive loop as loosely typed JSON, which is why
//! those fields are `serde_json::Value`.

use crate::pipeline::StepPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields every stage result carries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetadata {
    pub thought_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Wall time the stage took
    #[serde(default)]
    pub processing_time_ms: f64,
    #[serde(default)]
    pub tokens_used: Option<u64>,
}

impl StepMetadata {
    pub fn new(thought_id: impl Into<String>) -> Self {
        Self {
            thought_id: thought_id.into(),
            task_id: None,
            timestamp: Utc::now(),
            processing_time_ms: 0.0,
            tokens_used: None,
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_timing(mut self, processing_time_ms: f64, tokens_used: Option<u64>) -> Self {
        self.processing_time_ms = processing_time_ms;
        self.tokens_used = tokens_used;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatherContextResult {
    pub metadata: StepMetadata,
    #[serde(default)]
    pub system_snapshot: Value,
    #[serde(default)]
    pub agent_identity: Value,
    #[serde(default)]
    pub thought_context: Value,
    #[serde(default)]
    pub permitted_actions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformDmasResult {
    pub metadata: StepMetadata,
    #[serde(default)]
    pub ethical_dma: Option<Value>,
    #[serde(default)]
    pub common_sense_dma: Option<Value>,
    #[serde(default)]
    pub domain_dma: Option<Value>,
    #[serde(default)]
    pub dmas_executed: Vec<String>,
    #[serde(default)]
    pub dma_failures: Vec<String>,
    #[serde(default)]
    pub longest_dma_time_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformAspdmaResult {
    pub metadata: StepMetadata,
    pub selected_action: String,
    #[serde(default)]
    pub action_parameters: Value,
    #[serde(default)]
    pub selection_reasoning: String,
    /// Re-selection after a failed conscience check
    #[serde(default)]
    pub is_recursive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConscienceVerdict {
    pub conscience: String,
    pub passed: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConscienceExecutionResult {
    pub metadata: StepMetadata,
    pub selected_action: String,
    pub conscience_passed: bool,
    #[serde(default)]
    pub verdicts: Vec<ConscienceVerdict>,
    /// Action the consciences substituted, if any
    #[serde(default)]
    pub override_action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionCompleteResult {
    pub metadata: StepMetadata,
    pub action_executed: String,
    pub dispatch_success: bool,
    #[serde(default)]
    pub handler_completed: bool,
    #[serde(default)]
    pub follow_up_processing_pending: bool,
    #[serde(default)]
    pub execution_time_ms: f64,
}

/// Result of one stage for one thought
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step_point", rename_all = "snake_case")]
pub enum StepResult {
    GatherContext(GatherContextResult),
    PerformDmas(PerformDmasResult),
    PerformAspdma(PerformAspdmaResult),
    ConscienceExecution(ConscienceExecutionResult),
    ActionComplete(ActionCompleteResult),
}

impl StepResult {
    pub fn step_point(&self) -> StepPoint {
        match self {
            Self::GatherContext(_) => StepPoint::GatherContext,
            Self::PerformDmas(_) => StepPoint::PerformDmas,
            Self::PerformAspdma(_) => StepPoint::PerformAspdma,
            Self::ConscienceExecution(_) => StepPoint::ConscienceExecution,
            Self::ActionComplete(_) => StepPoint::ActionComplete,
        }
    }

    /// Result for `step` carrying only metadata
    pub fn empty(step: StepPoint, metadata: StepMetadata) -> Self {
        match step {
            StepPoint::GatherContext => Self::GatherContext(GatherContextResult {
                metadata,
                ..Default::default()
            }),
            StepPoint::PerformDmas => Self::PerformDmas(PerformDmasResult {
                metadata,
                ..Default::default()
            }),
            StepPoint::PerformAspdma => Self::PerformAspdma(PerformAspdmaResult {
                metadata,
                ..Default::default()
            }),
            StepPoint::ConscienceExecution => {
                Self::ConscienceExecution(ConscienceExecutionResult {
                    metadata,
                    conscience_passed: true,
                    ..Default::default()
                })
            }
            StepPoint::ActionComplete => Self::ActionComplete(ActionCompleteResult {
                metadata,
                dispatch_success: true,
                handler_completed: true,
                ..Default::default()
            }),
        }
    }

    pub fn metadata(&self) -> &StepMetadata {
        match self {
            Self::GatherContext(r) => &r.metadata,
            Self::PerformDmas(r) => &r.metadata,
            Self::PerformAspdma(r) => &r.metadata,
            Self::ConscienceExecution(r) => &r.metadata,
            Self::ActionComplete(r) => &r.metadata,
        }
    }

    pub fn thought_id(&self) -> &str {
        &self.metadata().thought_id
    }

    pub fn processing_time_ms(&self) -> f64 {
        self.metadata().processing_time_ms
    }

    pub fn tokens_used(&self) -> Option<u64> {
        self.metadata().tokens_used
    }

    /// `Some(false)` only for a conscience result that failed
    pub fn conscience_passed(&self) -> Option<bool> {
        match self {
            Self::ConscienceExecution(r) => Some(r.conscience_passed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_point_matches_variant() {
        let result = StepResult::PerformDmas(PerformDmasResult {
            metadata: StepMetadata::new("t1"),
            dmas_executed: vec!["ethical".to_string(), "common_sense".to_string()],
            ..Default::default()
        });
        assert_eq!(result.step_point(), StepPoint::PerformDmas);
        assert_eq!(result.thought_id(), "t1");
        assert_eq!(result.conscience_passed(), None);
    }

    #[test]
    fn test_serialized_form_is_tagged_by_step_point() {
        let result = StepResult::ConscienceExecution(ConscienceExecutionResult {
            metadata: StepMetadata::new("t2").with_task("task-1").with_timing(12.5, Some(40)),
            selected_action: "speak".to_string(),
            conscience_passed: false,
            verdicts: vec![ConscienceVerdict {
                conscience: "entropy".to_string(),
                passed: false,
                reason: Some("too chaotic".to_string()),
            }],
            override_action: Some("ponder".to_string()),
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["step_point"], "conscience_execution");
        assert_eq!(value["metadata"]["task_id"], "task-1");
        assert_eq!(value["metadata"]["tokens_used"], 40);
        assert_eq!(value["verdicts"][0]["conscience"], "entropy");

        let parsed: StepResult = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.conscience_passed(), Some(false));
        assert_eq!(parsed.processing_time_ms(), 12.5);
    }

    #[test]
    fn test_empty_result_defaults_to_success() {
        for step in StepPoint::ALL {
            let result = StepResult::empty(step, StepMetadata::new("t1"));
            assert_eq!(result.step_point(), step);
        }
        let conscience =
            StepResult::empty(StepPoint::ConscienceExecution, StepMetadata::new("t1"));
        assert_eq!(conscience.conscience_passed(), Some(true));
    }

    #[test]
    fn test_deserialize_with_loose_dma_payloads() {
        let value = json!({
            "step_point": "perform_dmas",
            "metadata": {"thought_id": "t3", "timestamp": "2025-01-01T00:00:00Z"},
            "ethical_dma": {"decision": "approve", "alignment": {"beneficence": 0.9}},
            "dmas_executed": ["ethical"]
        });
        let parsed: StepResult = serde_json::from_value(value).unwrap();
        match parsed {
            StepResult::PerformDmas(r) => {
                assert_eq!(r.ethical_dma.unwrap()["decision"], "approve");
                assert!(r.domain_dma.is_none());
                assert_eq!(r.metadata.processing_time_ms, 0.0);
            }
            other => panic!("wrong variant {:?}", other.step_point()),
        }
    }
}
