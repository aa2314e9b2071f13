//! # Runtime Control Façade
//!
//! The operator-facing surface. Holds no state of its own: every call is
//! delegated to the pipeline controller or the selection registry, and every
//! composite response passes through [`sanitize`](crate::control::sanitize)
//! before it is returned.

use crate::config::{ControlSettings, RuntimeControlConfig};
use crate::constants::control::DEFAULT_SECONDS_PER_THOUGHT;
use crate::control::processor_states::{processor_state_catalogue, ProcessorStateInfo};
use crate::control::responses::{
    ProcessorControlResponse, ProcessorStatus, QueueStatus, SingleStepResponse,
};
use crate::control::sanitize;
use crate::error::Result;
use crate::logging::log_control_error;
use crate::pipeline::{
    PipelineError, PipelineState, PipelineStepController, ProcessingMetrics, SingleStepOutcome,
    StageProcessor, StepResult,
};
use crate::registry::{
    CircuitBreakerReset, PriorityChange, PriorityUpdateRequest, RegistryError,
    SelectionExplanation, ServiceHealthStatus, ServiceSelectionRegistry, ServiceType,
};
use crate::resilience::CircuitBreakerStatus;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Pipeline operations the façade needs. Implemented by
/// [`PipelineStepController`]; test doubles plug in here.
#[async_trait]
pub trait PipelineControl: Send + Sync {
    /// Returns whether the pipeline was running before
    fn pause(&self) -> bool;
    /// Returns whether the pipeline was paused before
    fn resume(&self) -> bool;
    fn is_paused(&self) -> bool;
    async fn single_step(&self) -> std::result::Result<SingleStepOutcome, PipelineError>;
    fn current_state(&self) -> PipelineState;
    fn latest_step_result(&self) -> Option<StepResult>;
    fn processing_metrics(&self) -> ProcessingMetrics;
}

#[async_trait]
impl PipelineControl for PipelineStepController {
    fn pause(&self) -> bool {
        PipelineStepController::pause(self)
    }

    fn resume(&self) -> bool {
        PipelineStepController::resume(self)
    }

    fn is_paused(&self) -> bool {
        PipelineStepController::is_paused(self)
    }

    async fn single_step(&self) -> std::result::Result<SingleStepOutcome, PipelineError> {
        PipelineStepController::single_step(self).await
    }

    fn current_state(&self) -> PipelineState {
        self.get_current_state()
    }

    fn latest_step_result(&self) -> Option<StepResult> {
        self.get_latest_step_result()
    }

    fn processing_metrics(&self) -> ProcessingMetrics {
        self.get_processing_metrics()
    }
}

/// Reports the agent's active cognitive state, e.g. `WORK` or `AgentState.WORK`
pub trait CognitiveStateSource: Send + Sync {
    fn current_state_name(&self) -> Option<String>;
}

pub struct RuntimeControlService {
    pipeline: Arc<dyn PipelineControl>,
    registry: Arc<ServiceSelectionRegistry>,
    settings: ControlSettings,
    cognitive_state: Option<Arc<dyn CognitiveStateSource>>,
}

impl std::fmt::Debug for RuntimeControlService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeControlService")
            .field("processor_name", &self.settings.processor_name)
            .field("registry", &self.registry)
            .finish()
    }
}

impl RuntimeControlService {
    pub fn new(
        pipeline: Arc<dyn PipelineControl>,
        registry: Arc<ServiceSelectionRegistry>,
        settings: ControlSettings,
    ) -> Self {
        Self {
            pipeline,
            registry,
            settings,
            cognitive_state: None,
        }
    }

    pub fn with_cognitive_state_source(mut self, source: Arc<dyn CognitiveStateSource>) -> Self {
        self.cognitive_state = Some(source);
        self
    }

    pub fn registry(&self) -> &Arc<ServiceSelectionRegistry> {
        &self.registry
    }

    pub fn processor_name(&self) -> &str {
        &self.settings.processor_name
    }

    pub fn pause(&self, reason: &str) -> ProcessorControlResponse {
        let changed = self.pipeline.pause();
        let reason = sanitize::text(reason);
        info!(reason = %reason, changed = changed, "⏸️ Processor pause requested");
        let message = if changed {
            format!("Processor paused: {reason}")
        } else {
            "Processor already paused".to_string()
        };
        self.control_response("pause", message)
    }

    pub fn resume(&self, reason: &str) -> ProcessorControlResponse {
        let changed = self.pipeline.resume();
        let reason = sanitize::text(reason);
        info!(reason = %reason, changed = changed, "▶️ Processor resume requested");
        let message = if changed {
            format!("Processor resumed: {reason}")
        } else {
            "Processor already running".to_string()
        };
        self.control_response("resume", message)
    }

    fn control_response(&self, operation: &str, message: String) -> ProcessorControlResponse {
        ProcessorControlResponse {
            success: true,
            processor_name: self.settings.processor_name.clone(),
            operation: operation.to_string(),
            new_status: ProcessorStatus::from_paused(self.pipeline.is_paused()),
            message,
            error: None,
        }
    }

    /// Run one tick and assemble the composite response. Snapshot and metrics
    /// are attached when `include_details` is set or configured always-on.
    pub async fn single_step(&self, include_details: bool) -> SingleStepResponse {
        let outcome = self.pipeline.single_step().await;
        let state = self.pipeline.current_state();
        let mut response = SingleStepResponse {
            success: false,
            message: String::new(),
            processor_name: self.settings.processor_name.clone(),
            processor_status: ProcessorStatus::from_paused(state.is_paused),
            cognitive_state: self.cognitive_state_name(),
            queue_depth: state.queue_size(),
            round_number: None,
            steps_processed: 0,
            step_point: None,
            step_result: None,
            results_by_round: BTreeMap::new(),
            failures: Vec::new(),
            pipeline_state: None,
            processing_metrics: None,
            processing_time_ms: None,
            tokens_used: None,
            error: None,
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_caller_error() {
                    warn!(error = %e, "Single-step rejected");
                } else {
                    log_control_error("runtime_control", "single_step", &e.to_string(), None);
                }
                response.message = format!("Single step failed: {e}");
                response.error = Some(e.to_string());
                return response;
            }
        };

        let step_result = outcome
            .representative_result()
            .and_then(sanitize::step_result);
        response.success = true;
        response.message = format!(
            "Single step completed: round {}, {} steps processed, {} failed",
            outcome.round_number,
            outcome.steps_processed,
            outcome.failures.len()
        );
        response.round_number = Some(outcome.round_number);
        response.steps_processed = outcome.steps_processed;
        response.step_point = step_result.as_ref().and(outcome.step_point());
        response.step_result = step_result;
        response.results_by_round = sanitize::results_by_round(&outcome.results_by_round);
        response.failures = outcome
            .failures
            .into_iter()
            .map(|mut failure| {
                failure.error = sanitize::text(&failure.error);
                failure
            })
            .collect();
        response.processing_time_ms = sanitize::duration_ms(outcome.processing_time_ms);
        response.tokens_used = Some(outcome.tokens_used);

        if include_details || self.settings.always_include_step_details {
            response.pipeline_state = sanitize::pipeline_state(state);
            response.processing_metrics =
                sanitize::processing_metrics(self.pipeline.processing_metrics());
        }
        response
    }

    pub fn queue_status(&self) -> QueueStatus {
        let state = self.pipeline.current_state();
        let metrics = self.pipeline.processing_metrics();
        let oldest_message_age_seconds = state.oldest_queued_at().map(|oldest| {
            let age_ms = (Utc::now() - oldest).num_milliseconds().max(0);
            age_ms as f64 / 1000.0
        });

        QueueStatus {
            processor_name: self.settings.processor_name.clone(),
            queue_size: state.queue_size(),
            max_size: self.settings.max_queue_size,
            processing_rate: metrics
                .seconds_per_thought()
                .and_then(sanitize::duration_ms)
                .unwrap_or(DEFAULT_SECONDS_PER_THOUGHT),
            average_latency_ms: sanitize::duration_ms(metrics.average_thought_time_ms)
                .unwrap_or(0.0),
            oldest_message_age_seconds,
        }
    }

    fn cognitive_state_name(&self) -> Option<String> {
        self.cognitive_state
            .as_ref()
            .and_then(|source| source.current_state_name())
            .map(|name| sanitize::text(&name))
    }

    pub fn processor_states(&self) -> Vec<ProcessorStateInfo> {
        processor_state_catalogue(self.cognitive_state_name().as_deref())
    }

    pub fn update_service_priority(
        &self,
        provider_name: &str,
        request: &PriorityUpdateRequest,
    ) -> Result<PriorityChange> {
        let update = request.validate()?;
        Ok(self.registry.update_priority(provider_name, update)?)
    }

    pub fn reset_circuit_breakers(&self, service_type: Option<&str>) -> Result<CircuitBreakerReset> {
        let service_type = parse_service_type(service_type)?;
        Ok(self.registry.reset_circuit_breakers(service_type))
    }

    pub fn circuit_breaker_status(
        &self,
        service_type: Option<&str>,
    ) -> Result<BTreeMap<String, CircuitBreakerStatus>> {
        let service_type = parse_service_type(service_type)?;
        Ok(self.registry.circuit_breaker_status(service_type))
    }

    pub fn selection_explanation(&self) -> SelectionExplanation {
        self.registry.explain_selection()
    }

    pub fn service_health(&self) -> ServiceHealthStatus {
        self.registry.service_health()
    }
}

fn parse_service_type(
    service_type: Option<&str>,
) -> std::result::Result<Option<ServiceType>, RegistryError> {
    service_type
        .map(|s| {
            s.parse::<ServiceType>()
                .map_err(|message| RegistryError::invalid_field("service_type", message))
        })
        .transpose()
}

/// Controller, registry and façade wired from one configuration
#[derive(Debug)]
pub struct ControlPlane {
    pub controller: Arc<PipelineStepController>,
    pub registry: Arc<ServiceSelectionRegistry>,
    pub service: RuntimeControlService,
}

pub fn bootstrap(
    config: &RuntimeControlConfig,
    processor: Arc<dyn StageProcessor>,
) -> Result<ControlPlane> {
    config.validate()?;
    let registry = Arc::new(ServiceSelectionRegistry::from_config(config)?);
    let controller = Arc::new(PipelineStepController::new(
        processor,
        config.pipeline.clone(),
    ));
    let service = RuntimeControlService::new(
        controller.clone(),
        registry.clone(),
        config.control.clone(),
    );
    info!(
        processor_name = %config.control.processor_name,
        providers = registry.len(),
        "🚀 Runtime control plane ready"
    );
    Ok(ControlPlane {
        controller,
        registry,
        service,
    })
}
