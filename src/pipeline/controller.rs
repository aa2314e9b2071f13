//! # Pipeline Step Controller
//!
//! Owns the [`PipelineState`] and decides when a thought may advance. While
//! running, the cognitive loop checks [`PipelineStepController::can_process`]
//! and reports each finished stage. While paused, nothing advances except
//! through [`PipelineStepController::single_step`], which runs one stage for
//! every tracked thought and then bumps the round counter.

use crate::config::PipelineSettings;
use crate::logging::{log_control_error, log_pipeline_operation};
use crate::pipeline::{
    MetricsRecorder, PipelineError, PipelineState, ProcessingMetrics, QueuedTask, QueuedThought,
    StageError, StepPoint, StepResult, ThoughtInPipeline,
};
use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs one pipeline stage for one thought.
///
/// Implemented by the cognitive loop. The controller never interprets the
/// stage work itself, only the returned [`StepResult`].
#[async_trait]
pub trait StageProcessor: Send + Sync {
    async fn process_step(
        &self,
        step: StepPoint,
        thought: &ThoughtInPipeline,
    ) -> Result<StepResult, StageError>;
}

/// What happened to a thought after one of its stages was applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ThoughtProgress {
    Advanced { from: StepPoint, to: StepPoint },
    /// Conscience check failed; back to action selection
    ReturnedForReselection { recursion_count: u32 },
    /// Finished ACTION_COMPLETE and left the pipeline
    Completed,
    /// Stage failed; the thought stays where it was
    Failed { step_point: StepPoint, error: String },
}

impl ThoughtProgress {
    fn label(&self) -> &'static str {
        match self {
            Self::Advanced { .. } => "advanced",
            Self::ReturnedForReselection { .. } => "returned_for_reselection",
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub thought_id: String,
    pub step_point: StepPoint,
    pub error: String,
}

/// Summary of one single-step tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleStepOutcome {
    /// Round this tick completed
    pub round_number: u64,
    /// Stages that succeeded
    pub steps_processed: usize,
    pub thoughts_completed: usize,
    pub results_by_round: BTreeMap<u64, Vec<StepResult>>,
    pub failures: Vec<StepFailure>,
    /// Wall time of the tick
    pub processing_time_ms: f64,
    pub tokens_used: u64,
}

impl SingleStepOutcome {
    pub fn step_results(&self) -> &[StepResult] {
        self.results_by_round
            .get(&self.round_number)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Result from the furthest-advanced stage this tick, first one on ties
    pub fn representative_result(&self) -> Option<&StepResult> {
        self.step_results()
            .iter()
            .rev()
            .max_by_key(|r| r.step_point())
    }

    pub fn step_point(&self) -> Option<StepPoint> {
        self.representative_result().map(StepResult::step_point)
    }
}

enum StepApplication {
    Accepted(StepResult, ThoughtProgress),
    Failed(String),
    /// The thought was aborted or completed while its stage ran
    Untracked,
}

struct ControllerInner {
    state: PipelineState,
    latest_step_result: Option<StepResult>,
    metrics: MetricsRecorder,
}

impl ControllerInner {
    fn apply(
        &mut self,
        thought_id: &str,
        step: StepPoint,
        result: Result<StepResult, StageError>,
        max_conscience_retries: u32,
    ) -> StepApplication {
        let Some(mut thought) = self.state.take_thought(thought_id) else {
            return StepApplication::Untracked;
        };

        let checked = if thought.current_step != step {
            Err(format!(
                "thought moved from {step} to {} while its stage ran",
                thought.current_step
            ))
        } else {
            result
                .map_err(|e| e.message)
                .and_then(|r| check_result(r, thought_id, step))
        };
        let step_result = match checked {
            Ok(r) => r,
            Err(message) => {
                self.state.place(thought);
                self.metrics.record_failure();
                return StepApplication::Failed(message);
            }
        };

        let elapsed_ms = clamp_duration(step_result.processing_time_ms());
        thought.record_step(step, elapsed_ms);
        self.metrics
            .record_step(step, elapsed_ms, step_result.tokens_used());

        let progress = match route(&thought, &step_result, max_conscience_retries) {
            Some(next) => {
                thought.move_to(next);
                let progress = if step == StepPoint::ConscienceExecution
                    && next == StepPoint::PerformAspdma
                {
                    ThoughtProgress::ReturnedForReselection {
                        recursion_count: thought.recursion_count,
                    }
                } else {
                    ThoughtProgress::Advanced {
                        from: step,
                        to: next,
                    }
                };
                self.state.place(thought);
                progress
            }
            None => {
                self.state.total_thoughts_processed += 1;
                self.metrics
                    .record_thought_completed(thought.processing_time_ms);
                ThoughtProgress::Completed
            }
        };

        self.latest_step_result = Some(step_result.clone());
        StepApplication::Accepted(step_result, progress)
    }
}

/// A stage result must describe the stage the thought was at, for that thought
fn check_result(
    result: StepResult,
    thought_id: &str,
    step: StepPoint,
) -> Result<StepResult, String> {
    if result.step_point() != step {
        return Err(format!(
            "stage returned a {} result for a thought at {step}",
            result.step_point()
        ));
    }
    if !result.thought_id().is_empty() && result.thought_id() != thought_id {
        return Err(format!(
            "stage returned a result for thought '{}'",
            result.thought_id()
        ));
    }
    Ok(result)
}

fn route(
    thought: &ThoughtInPipeline,
    result: &StepResult,
    max_conscience_retries: u32,
) -> Option<StepPoint> {
    if result.conscience_passed() == Some(false)
        && thought.recursion_count < max_conscience_retries
    {
        return Some(StepPoint::PerformAspdma);
    }
    thought.current_step.next()
}

fn clamp_duration(ms: f64) -> f64 {
    if ms.is_finite() && ms > 0.0 {
        ms
    } else {
        0.0
    }
}

/// Raised for the duration of a tick, lowered on drop even if the tick
/// future is cancelled
struct TickFlag<'a>(&'a AtomicBool);

impl<'a> TickFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for TickFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct PipelineStepController {
    inner: RwLock<ControllerInner>,
    processor: Arc<dyn StageProcessor>,
    settings: PipelineSettings,
    tick_lock: tokio::sync::Mutex<()>,
    tick_in_progress: AtomicBool,
}

impl fmt::Debug for PipelineStepController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("PipelineStepController")
            .field("is_paused", &inner.state.is_paused)
            .field("current_round", &inner.state.current_round)
            .field("in_flight", &inner.state.total_in_flight())
            .field("tick_in_progress", &self.is_tick_in_progress())
            .finish()
    }
}

impl PipelineStepController {
    pub fn new(processor: Arc<dyn StageProcessor>, settings: PipelineSettings) -> Self {
        Self {
            inner: RwLock::new(ControllerInner {
                state: PipelineState::default(),
                latest_step_result: None,
                metrics: MetricsRecorder::new(settings.max_thought_history),
            }),
            processor,
            settings,
            tick_lock: tokio::sync::Mutex::new(()),
            tick_in_progress: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Stop free-running advancement. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        let mut inner = self.inner.write();
        if inner.state.is_paused {
            debug!("Pause requested while already paused");
            return false;
        }
        inner.state.is_paused = true;
        log_pipeline_operation(
            "pause",
            inner.state.current_round,
            None,
            None,
            "paused",
            None,
        );
        true
    }

    /// Return to free-running mode. Returns whether the state changed.
    pub fn resume(&self) -> bool {
        let mut inner = self.inner.write();
        if !inner.state.is_paused {
            debug!("Resume requested while already running");
            return false;
        }
        inner.state.is_paused = false;
        inner.metrics.record_pause_resume_cycle();
        log_pipeline_operation(
            "resume",
            inner.state.current_round,
            None,
            None,
            "running",
            None,
        );
        true
    }

    pub fn is_paused(&self) -> bool {
        self.inner.read().state.is_paused
    }

    pub fn is_tick_in_progress(&self) -> bool {
        self.tick_in_progress.load(Ordering::SeqCst)
    }

    pub fn current_round(&self) -> u64 {
        self.inner.read().state.current_round
    }

    /// Run one stage for every tracked thought, then advance the round.
    ///
    /// Only legal while paused, and only one tick at a time. A failing stage
    /// leaves its thought in place without affecting the others.
    pub async fn single_step(&self) -> Result<SingleStepOutcome, PipelineError> {
        let _tick = self.tick_lock.try_lock().map_err(|_| {
            warn!("Rejected single-step: another tick is running");
            PipelineError::TickInProgress
        })?;
        let _flag = TickFlag::raise(&self.tick_in_progress);

        let (round, frontier) = {
            let inner = self.inner.read();
            if !inner.state.is_paused {
                warn!("Rejected single-step: pipeline is running");
                return Err(PipelineError::NotPaused);
            }
            let frontier: Vec<ThoughtInPipeline> = inner.state.all_thoughts().cloned().collect();
            (inner.state.current_round, frontier)
        };

        let round_number = round + 1;
        let started = Instant::now();
        log_pipeline_operation(
            "single_step",
            round_number,
            None,
            None,
            "started",
            Some(&format!("{} thoughts in flight", frontier.len())),
        );

        let processor = &self.processor;
        let outcomes = join_all(frontier.iter().map(|thought| async move {
            let result = AssertUnwindSafe(processor.process_step(thought.current_step, thought))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(StageError::new("stage processing panicked")));
            (thought, result)
        }))
        .await;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut thoughts_completed = 0;
        {
            let mut inner = self.inner.write();
            for (thought, result) in outcomes {
                let step = thought.current_step;
                match inner.apply(
                    &thought.thought_id,
                    step,
                    result,
                    self.settings.max_conscience_retries,
                ) {
                    StepApplication::Accepted(step_result, progress) => {
                        if progress == ThoughtProgress::Completed {
                            thoughts_completed += 1;
                        }
                        log_pipeline_operation(
                            "advance_thought",
                            round_number,
                            Some(&thought.thought_id),
                            Some(step.as_str()),
                            progress.label(),
                            None,
                        );
                        results.push(step_result);
                    }
                    StepApplication::Failed(error) => {
                        warn!(
                            thought_id = %thought.thought_id,
                            step_point = %step,
                            error = %error,
                            "Stage failed during single-step"
                        );
                        failures.push(StepFailure {
                            thought_id: thought.thought_id.clone(),
                            step_point: step,
                            error,
                        });
                    }
                    StepApplication::Untracked => {
                        debug!(
                            thought_id = %thought.thought_id,
                            "Thought left the pipeline while its stage ran"
                        );
                    }
                }
            }
            inner.state.current_round = round_number;
            inner.metrics.record_single_step();

            if let Err(e) = inner.state.check_invariants() {
                log_control_error("pipeline", "single_step", &e.to_string(), None);
                return Err(e);
            }
        }

        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        let tokens_used = results
            .iter()
            .filter_map(StepResult::tokens_used)
            .fold(0u64, u64::saturating_add);
        info!(
            round = round_number,
            steps_processed = results.len(),
            failures = failures.len(),
            thoughts_completed = thoughts_completed,
            processing_time_ms = processing_time_ms,
            "Single-step tick complete"
        );

        Ok(SingleStepOutcome {
            round_number,
            steps_processed: results.len(),
            thoughts_completed,
            results_by_round: BTreeMap::from([(round_number, results)]),
            failures,
            processing_time_ms,
            tokens_used,
        })
    }

    /// Snapshot of the pipeline; later changes do not affect it
    pub fn get_current_state(&self) -> PipelineState {
        self.inner.read().state.clone()
    }

    pub fn get_latest_step_result(&self) -> Option<StepResult> {
        self.inner.read().latest_step_result.clone()
    }

    pub fn get_processing_metrics(&self) -> ProcessingMetrics {
        self.inner.read().metrics.snapshot()
    }

    /// Whether the cognitive loop may run `step` for this thought right now
    pub fn can_process(&self, step: StepPoint, thought_id: &str) -> bool {
        if self.is_tick_in_progress() {
            return false;
        }
        let inner = self.inner.read();
        !inner.state.is_paused
            && inner
                .state
                .find_thought(thought_id)
                .is_some_and(|t| t.current_step == step)
    }

    /// Apply a stage the cognitive loop ran on its own. Does not change the round.
    pub fn report_step_result(
        &self,
        thought_id: &str,
        result: Result<StepResult, StageError>,
    ) -> Result<ThoughtProgress, PipelineError> {
        let mut inner = self.inner.write();
        if self.is_tick_in_progress() {
            return Err(PipelineError::TickInProgress);
        }
        let step = inner
            .state
            .find_thought(thought_id)
            .map(|t| t.current_step)
            .ok_or_else(|| PipelineError::ThoughtNotTracked {
                thought_id: thought_id.to_string(),
            })?;

        let round = inner.state.current_round;
        let progress = match inner.apply(
            thought_id,
            step,
            result,
            self.settings.max_conscience_retries,
        ) {
            StepApplication::Accepted(_, progress) => progress,
            StepApplication::Failed(error) => ThoughtProgress::Failed {
                step_point: step,
                error,
            },
            StepApplication::Untracked => {
                return Err(PipelineError::ThoughtNotTracked {
                    thought_id: thought_id.to_string(),
                })
            }
        };
        log_pipeline_operation(
            "report_step_result",
            round,
            Some(thought_id),
            Some(step.as_str()),
            progress.label(),
            None,
        );
        Ok(progress)
    }

    pub fn enqueue_task(&self, task: QueuedTask) -> Result<(), PipelineError> {
        let mut inner = self.inner.write();
        if inner
            .state
            .task_queue
            .iter()
            .any(|t| t.task_id == task.task_id)
        {
            return Err(PipelineError::TaskAlreadyQueued {
                task_id: task.task_id,
            });
        }
        debug!(task_id = %task.task_id, "Task queued");
        inner.state.task_queue.push(task);
        Ok(())
    }

    pub fn dequeue_task(&self, task_id: &str) -> Option<QueuedTask> {
        let mut inner = self.inner.write();
        let index = inner
            .state
            .task_queue
            .iter()
            .position(|t| t.task_id == task_id)?;
        Some(inner.state.task_queue.remove(index))
    }

    pub fn enqueue_thought(&self, thought: QueuedThought) -> Result<(), PipelineError> {
        let mut inner = self.inner.write();
        let duplicate = inner.state.contains_thought(&thought.thought_id)
            || inner
                .state
                .thought_queue
                .iter()
                .any(|t| t.thought_id == thought.thought_id);
        if duplicate {
            return Err(PipelineError::ThoughtAlreadyTracked {
                thought_id: thought.thought_id,
            });
        }
        debug!(thought_id = %thought.thought_id, "Thought queued");
        inner.state.thought_queue.push(thought);
        Ok(())
    }

    /// Move a queued thought into the first stage
    pub fn admit_thought(&self, thought_id: &str) -> Result<ThoughtInPipeline, PipelineError> {
        let mut inner = self.inner.write();
        let index = inner
            .state
            .thought_queue
            .iter()
            .position(|t| t.thought_id == thought_id)
            .ok_or_else(|| PipelineError::QueuedThoughtNotFound {
                thought_id: thought_id.to_string(),
            })?;
        let queued = inner.state.thought_queue.remove(index);

        if let Some(task) = inner
            .state
            .task_queue
            .iter_mut()
            .find(|t| t.task_id == queued.source_task_id)
        {
            task.thoughts_generated += 1;
        }

        let thought = ThoughtInPipeline::new(
            queued.thought_id,
            queued.source_task_id,
            queued.thought_type,
        );
        log_pipeline_operation(
            "admit_thought",
            inner.state.current_round,
            Some(&thought.thought_id),
            Some(thought.current_step.as_str()),
            "admitted",
            None,
        );
        inner.state.place(thought.clone());
        Ok(thought)
    }

    /// Start tracking a thought directly at its current step
    pub fn track_thought(&self, thought: ThoughtInPipeline) -> Result<(), PipelineError> {
        let mut inner = self.inner.write();
        if inner.state.contains_thought(&thought.thought_id) {
            return Err(PipelineError::ThoughtAlreadyTracked {
                thought_id: thought.thought_id,
            });
        }
        log_pipeline_operation(
            "track_thought",
            inner.state.current_round,
            Some(&thought.thought_id),
            Some(thought.current_step.as_str()),
            "tracked",
            None,
        );
        inner.state.place(thought);
        Ok(())
    }

    /// Drop a thought from tracking without completing it
    pub fn abort_thought(&self, thought_id: &str) -> Option<ThoughtInPipeline> {
        let mut inner = self.inner.write();
        let removed = inner.state.take_thought(thought_id)?;
        log_pipeline_operation(
            "abort_thought",
            inner.state.current_round,
            Some(thought_id),
            Some(removed.current_step.as_str()),
            "aborted",
            None,
        );
        Some(removed)
    }
}
