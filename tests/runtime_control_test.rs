mod common;

use common::*;
use runtime_control::config::{ConfigManager, RuntimeControlConfig};
use runtime_control::control::ProcessorStatus;
use runtime_control::pipeline::{QueuedTask, QueuedThought, StepPoint};
use runtime_control::registry::{OverallHealth, PriorityUpdateRequest};
use runtime_control::resilience::CircuitState;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: &str = r#"
control:
  processor_name: datum-agent
  max_queue_size: 50
registry:
  required_service_types: [llm]
  providers:
    - name: primary_llm
      service_type: llm
      priority: HIGH
    - name: backup_llm
      service_type: llm
      priority: LOW
    - name: mock_llm
      service_type: llm
      priority_group: 1
production:
  control:
    always_include_step_details: false
"#;

fn load(environment: &str) -> (TempDir, RuntimeControlConfig) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("runtime-control.yaml"), CONFIG).unwrap();
    let manager =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), environment)
            .unwrap();
    let config = manager.config().clone();
    (dir, config)
}

#[tokio::test]
async fn test_operator_debugging_session() {
    let (_dir, config) = load("test");
    let processor = Arc::new(ScriptedStageProcessor::new());
    let plane = control_plane(&config, processor);
    plane
        .controller
        .track_thought(thought_at("t1", StepPoint::GatherContext))
        .unwrap();

    let rejected = plane.service.single_step(true).await;
    assert!(!rejected.success);
    assert_eq!(rejected.processor_name, "datum-agent");
    assert!(rejected.message.contains("not paused"));

    let paused = plane.service.pause("stepping through a thought");
    assert_eq!(paused.new_status, ProcessorStatus::Paused);

    for round in 1..=3 {
        let response = plane.service.single_step(false).await;
        assert!(response.success, "{}", response.message);
        assert_eq!(response.round_number, Some(round));
        assert_eq!(response.processor_status, ProcessorStatus::Paused);
    }

    let resumed = plane.service.resume("done");
    assert_eq!(resumed.new_status, ProcessorStatus::Running);
    assert_eq!(plane.controller.current_round(), 3);
    assert_eq!(
        plane
            .controller
            .get_current_state()
            .find_thought("t1")
            .unwrap()
            .current_step,
        StepPoint::ConscienceExecution
    );
}

#[tokio::test]
async fn test_single_step_json_always_carries_detail_fields() {
    let (_dir, config) = load("production");
    assert!(!config.control.always_include_step_details);
    let plane = control_plane(&config, Arc::new(ScriptedStageProcessor::new()));
    plane.service.pause("inspect");

    // Empty pipeline: the tick succeeds with nothing to report
    let response = plane.service.single_step(false).await;
    assert!(response.success);
    assert!(response.pipeline_state.is_none());

    let json = serde_json::to_value(&response).unwrap();
    for field in [
        "step_point",
        "step_result",
        "pipeline_state",
        "processing_time_ms",
        "tokens_used",
    ] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
    assert!(json["step_point"].is_null());
    assert!(json["step_result"].is_null());

    let detailed = plane.service.single_step(true).await;
    assert!(detailed.pipeline_state.is_some());
    assert_eq!(detailed.processing_metrics.unwrap().single_steps, 2);
}

#[test]
fn test_queue_status_reflects_pending_work() {
    let (_dir, config) = load("test");
    let plane = control_plane(&config, Arc::new(ScriptedStageProcessor::new()));
    plane
        .controller
        .enqueue_task(QueuedTask::new("task-1", "greet"))
        .unwrap();
    plane
        .controller
        .enqueue_thought(QueuedThought::new("t1", "task-1", "standard"))
        .unwrap();
    plane
        .controller
        .enqueue_thought(QueuedThought::new("t2", "task-1", "follow_up"))
        .unwrap();

    let status = plane.service.queue_status();
    assert_eq!(status.processor_name, "datum-agent");
    assert_eq!(status.queue_size, 3);
    assert_eq!(status.max_size, 50);
    assert_eq!(status.processing_rate, 10.0);
    assert!(status.oldest_message_age_seconds.unwrap() >= 0.0);
}

#[test]
fn test_provider_administration_through_facade() {
    let (_dir, config) = load("test");
    let plane = control_plane(&config, Arc::new(ScriptedStageProcessor::new()));

    let change = plane
        .service
        .update_service_priority(
            "backup_llm",
            &PriorityUpdateRequest {
                priority: "CRITICAL".to_string(),
                priority_group: None,
                strategy: Some("ROUND_ROBIN".to_string()),
            },
        )
        .unwrap();
    assert_eq!(change.provider_name, "backup_llm");

    let explanation = plane.service.selection_explanation();
    assert!(!explanation.selection_flow.is_empty());
    assert_eq!(explanation.services["llm"].len(), 2);

    let err = plane
        .service
        .update_service_priority(
            "missing_llm",
            &PriorityUpdateRequest {
                priority: "HIGH".to_string(),
                priority_group: None,
                strategy: None,
            },
        )
        .unwrap_err();
    assert!(err.is_caller_error());
    assert!(err.to_string().contains("missing_llm"));
    assert_eq!(plane.service.selection_explanation(), explanation);

    plane
        .registry
        .provider("primary_llm")
        .unwrap()
        .circuit_breaker()
        .force_open();
    assert_eq!(
        plane.service.service_health().overall_health,
        OverallHealth::Degraded
    );

    let reset = plane.service.reset_circuit_breakers(Some("llm")).unwrap();
    assert_eq!(reset.reset_count, 3);
    let statuses = plane.service.circuit_breaker_status(None).unwrap();
    assert!(statuses.values().all(|s| s.state == CircuitState::Closed));
    assert_eq!(
        plane.service.service_health().overall_health,
        OverallHealth::Healthy
    );
}

#[test]
fn test_processor_state_catalogue_without_source() {
    let (_dir, config) = load("test");
    let plane = control_plane(&config, Arc::new(ScriptedStageProcessor::new()));
    let states = plane.service.processor_states();
    assert_eq!(states.len(), 6);
    assert!(states.iter().all(|s| !s.is_active));
}
