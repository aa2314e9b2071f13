//! Boundary validation for data leaving the control façade.
//!
//! Anything that fails a check becomes `None` (serialized as `null`) or is
//! dropped. Nothing here returns an error.

use crate::constants::control::MAX_BOUNDARY_TEXT_LEN;
use crate::pipeline::{PipelineState, ProcessingMetrics, StepPoint, StepResult};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Finite, non-negative durations only
pub fn duration_ms(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Cut free text to the boundary limit on a char boundary
pub fn text(value: &str) -> String {
    match value.char_indices().nth(MAX_BOUNDARY_TEXT_LEN) {
        Some((cut, _)) => format!("{}…", &value[..cut]),
        None => value.to_string(),
    }
}

/// A step result must serialize to an object tagged with a valid step point
pub fn step_result(result: &StepResult) -> Option<Value> {
    let value = match serde_json::to_value(result) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Dropping step result that failed to serialize");
            return None;
        }
    };
    step_result_value(value, Some(result.step_point()))
}

/// Validate a loosely typed step result. When `expected` is given the tag must
/// match it.
pub fn step_result_value(value: Value, expected: Option<StepPoint>) -> Option<Value> {
    let Value::Object(mut map) = value else {
        debug!("Dropping step result that is not a JSON object");
        return None;
    };
    let step_point = map
        .get("step_point")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<StepPoint>().ok())?;
    if expected.is_some_and(|expected| expected != step_point) {
        debug!(step_point = %step_point, "Dropping step result tagged with the wrong step point");
        return None;
    }

    if let Some(Value::Object(metadata)) = map.get_mut("metadata") {
        let bad_time = metadata
            .get("processing_time_ms")
            .is_some_and(|v| v.as_f64().and_then(duration_ms).is_none());
        if bad_time {
            metadata.insert("processing_time_ms".to_string(), Value::Null);
        }
    }
    Some(Value::Object(map))
}

/// Snapshots that break pipeline invariants are withheld
pub fn pipeline_state(state: PipelineState) -> Option<PipelineState> {
    match state.check_invariants() {
        Ok(()) => Some(state),
        Err(e) => {
            debug!(error = %e, "Withholding inconsistent pipeline snapshot");
            None
        }
    }
}

/// Metrics are withheld whole when any timing is not a finite, non-negative duration
pub fn processing_metrics(metrics: ProcessingMetrics) -> Option<ProcessingMetrics> {
    let valid = duration_ms(metrics.total_processing_time_ms).is_some()
        && duration_ms(metrics.average_thought_time_ms).is_some()
        && metrics
            .step_timings
            .values()
            .all(|ms| duration_ms(*ms).is_some());
    if !valid {
        debug!("Withholding processing metrics with invalid timings");
    }
    valid.then_some(metrics)
}

/// Keep only results that validate and belong to their round's stage tags
pub fn results_by_round(results: &BTreeMap<u64, Vec<StepResult>>) -> BTreeMap<u64, Vec<Value>> {
    results
        .iter()
        .map(|(round, results)| (*round, results.iter().filter_map(step_result).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{StepMetadata, ThoughtInPipeline};
    use serde_json::json;

    #[test]
    fn test_duration_rejects_non_finite_and_negative() {
        assert_eq!(duration_ms(12.5), Some(12.5));
        assert_eq!(duration_ms(0.0), Some(0.0));
        assert_eq!(duration_ms(-1.0), None);
        assert_eq!(duration_ms(f64::NAN), None);
        assert_eq!(duration_ms(f64::INFINITY), None);
    }

    #[test]
    fn test_text_truncates_long_input() {
        let long = "x".repeat(MAX_BOUNDARY_TEXT_LEN + 10);
        let cut = text(&long);
        assert_eq!(cut.chars().count(), MAX_BOUNDARY_TEXT_LEN + 1);
        assert_eq!(text("short"), "short");
    }

    #[test]
    fn test_malformed_step_results_become_none() {
        assert!(step_result_value(json!("not an object"), None).is_none());
        assert!(step_result_value(json!({"metadata": {}}), None).is_none());
        assert!(step_result_value(json!({"step_point": "finalize"}), None).is_none());
        assert!(step_result_value(
            json!({"step_point": "perform_dmas"}),
            Some(StepPoint::GatherContext)
        )
        .is_none());
    }

    #[test]
    fn test_bad_metadata_time_is_nulled() {
        let value = step_result_value(
            json!({
                "step_point": "GATHER_CONTEXT",
                "metadata": {"thought_id": "t1", "processing_time_ms": -4.0}
            }),
            None,
        )
        .unwrap();
        assert!(value["metadata"]["processing_time_ms"].is_null());
        assert_eq!(value["metadata"]["thought_id"], "t1");
    }

    #[test]
    fn test_typed_result_passes() {
        let result = StepResult::empty(
            StepPoint::ActionComplete,
            StepMetadata::new("t1").with_timing(3.0, None),
        );
        let value = step_result(&result).unwrap();
        assert_eq!(value["step_point"], "action_complete");
        assert_eq!(value["metadata"]["processing_time_ms"], 3.0);
    }

    #[test]
    fn test_metrics_with_any_bad_timing_are_withheld() {
        let healthy = ProcessingMetrics {
            total_processing_time_ms: 30.0,
            average_thought_time_ms: 15.0,
            step_timings: BTreeMap::from([(StepPoint::GatherContext, 30.0)]),
            ..Default::default()
        };
        assert_eq!(processing_metrics(healthy.clone()), Some(healthy.clone()));

        let negative_average = ProcessingMetrics {
            average_thought_time_ms: -5.0,
            ..healthy.clone()
        };
        assert!(processing_metrics(negative_average).is_none());

        let mut nan_timing = healthy;
        nan_timing
            .step_timings
            .insert(StepPoint::PerformDmas, f64::NAN);
        assert!(processing_metrics(nan_timing).is_none());
    }

    #[test]
    fn test_inconsistent_snapshot_is_withheld() {
        let mut state = PipelineState::default();
        let mut thought = ThoughtInPipeline::new("t1", "task", "standard");
        thought.current_step = StepPoint::PerformDmas;
        state
            .thoughts_by_step
            .get_mut(&StepPoint::GatherContext)
            .unwrap()
            .push(thought);
        assert!(pipeline_state(state).is_none());
        assert!(pipeline_state(PipelineState::default()).is_some());
    }
}
