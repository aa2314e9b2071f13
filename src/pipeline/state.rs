//! Pipeline data: thoughts in flight, pending queues, and the aggregate
//! [`PipelineState`] the controller owns and hands out as snapshots.

use crate::pipeline::{PipelineError, StepPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One thought's position in the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtInPipeline {
    pub thought_id: String,
    pub task_id: String,
    pub thought_type: String,
    pub current_step: StepPoint,
    pub entered_step_at: DateTime<Utc>,
    /// Cumulative stage time across completed steps
    pub processing_time_ms: f64,
    pub entered_pipeline_at: DateTime<Utc>,
    pub last_completed_step: Option<StepPoint>,
    /// Milliseconds spent in each completed stage (summed across re-selections)
    #[serde(default)]
    pub step_timings: BTreeMap<StepPoint, f64>,
    /// Currently re-selecting after a failed conscience check
    #[serde(default)]
    pub is_recursive: bool,
    #[serde(default)]
    pub recursion_count: u32,
}

impl ThoughtInPipeline {
    /// New thought at the first stage
    pub fn new(
        thought_id: impl Into<String>,
        task_id: impl Into<String>,
        thought_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            thought_id: thought_id.into(),
            task_id: task_id.into(),
            thought_type: thought_type.into(),
            current_step: StepPoint::GatherContext,
            entered_step_at: now,
            processing_time_ms: 0.0,
            entered_pipeline_at: now,
            last_completed_step: None,
            step_timings: BTreeMap::new(),
            is_recursive: false,
            recursion_count: 0,
        }
    }

    /// Account for a completed stage
    pub(crate) fn record_step(&mut self, step: StepPoint, elapsed_ms: f64) {
        self.processing_time_ms += elapsed_ms;
        *self.step_timings.entry(step).or_insert(0.0) += elapsed_ms;
        self.last_completed_step = Some(step);
    }

    /// Move to `next`. Callers only pass legal destinations.
    pub(crate) fn move_to(&mut self, next: StepPoint) {
        debug_assert!(self.current_step.can_transition_to(next));
        if next == StepPoint::PerformAspdma && self.current_step == StepPoint::ConscienceExecution {
            self.is_recursive = true;
            self.recursion_count += 1;
        } else if next == StepPoint::ConscienceExecution {
            self.is_recursive = false;
        }
        self.current_step = next;
        self.entered_step_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub task_id: String,
    pub description: String,
    pub status: String,
    pub channel_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub thoughts_generated: u32,
}

impl QueuedTask {
    pub fn new(task_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            description: description.into(),
            status: "pending".to_string(),
            channel_id: None,
            created_at: Utc::now(),
            thoughts_generated: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedThought {
    pub thought_id: String,
    pub thought_type: String,
    pub source_task_id: String,
    pub task_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub priority: i32,
    pub status: String,
}

impl QueuedThought {
    pub fn new(
        thought_id: impl Into<String>,
        source_task_id: impl Into<String>,
        thought_type: impl Into<String>,
    ) -> Self {
        Self {
            thought_id: thought_id.into(),
            thought_type: thought_type.into(),
            source_task_id: source_task_id.into(),
            task_description: None,
            created_at: Utc::now(),
            priority: 0,
            status: "pending".to_string(),
        }
    }
}

/// Aggregate pipeline view. Snapshots handed to callers are copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub is_paused: bool,
    /// Completed single-step ticks
    pub current_round: u64,
    pub thoughts_by_step: BTreeMap<StepPoint, Vec<ThoughtInPipeline>>,
    pub task_queue: Vec<QueuedTask>,
    pub thought_queue: Vec<QueuedThought>,
    /// Thoughts that finished ACTION_COMPLETE and left tracking
    pub total_thoughts_processed: u64,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            is_paused: false,
            current_round: 0,
            thoughts_by_step: StepPoint::ALL
                .into_iter()
                .map(|step| (step, Vec::new()))
                .collect(),
            task_queue: Vec::new(),
            thought_queue: Vec::new(),
            total_thoughts_processed: 0,
        }
    }
}

impl PipelineState {
    pub fn thoughts_at(&self, step: StepPoint) -> &[ThoughtInPipeline] {
        self.thoughts_by_step
            .get(&step)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find_thought(&self, thought_id: &str) -> Option<&ThoughtInPipeline> {
        self.thoughts_by_step
            .values()
            .flatten()
            .find(|t| t.thought_id == thought_id)
    }

    pub fn contains_thought(&self, thought_id: &str) -> bool {
        self.find_thought(thought_id).is_some()
    }

    pub fn total_in_flight(&self) -> usize {
        self.thoughts_by_step.values().map(Vec::len).sum()
    }

    /// Every tracked thought, earliest stage first
    pub fn all_thoughts(&self) -> impl Iterator<Item = &ThoughtInPipeline> {
        self.thoughts_by_step.values().flatten()
    }

    /// Pending tasks plus pending thoughts
    pub fn queue_size(&self) -> usize {
        self.task_queue.len() + self.thought_queue.len()
    }

    pub fn oldest_queued_at(&self) -> Option<DateTime<Utc>> {
        let oldest_task = self.task_queue.iter().map(|t| t.created_at).min();
        let oldest_thought = self.thought_queue.iter().map(|t| t.created_at).min();
        match (oldest_task, oldest_thought) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Add to the bucket of the thought's current step
    pub(crate) fn place(&mut self, thought: ThoughtInPipeline) {
        self.thoughts_by_step
            .entry(thought.current_step)
            .or_default()
            .push(thought);
    }

    /// Remove a thought from whichever bucket holds it
    pub(crate) fn take_thought(&mut self, thought_id: &str) -> Option<ThoughtInPipeline> {
        for bucket in self.thoughts_by_step.values_mut() {
            if let Some(index) = bucket.iter().position(|t| t.thought_id == thought_id) {
                return Some(bucket.remove(index));
            }
        }
        None
    }

    /// Every thought sits in the bucket of its own step, at most once
    pub fn check_invariants(&self) -> Result<(), PipelineError> {
        let mut seen = HashSet::new();
        for (step, bucket) in &self.thoughts_by_step {
            for thought in bucket {
                if thought.current_step != *step {
                    return Err(PipelineError::InvariantViolation(format!(
                        "thought '{}' is at {} but bucketed under {}",
                        thought.thought_id, thought.current_step, step
                    )));
                }
                if !seen.insert(thought.thought_id.as_str()) {
                    return Err(PipelineError::InvariantViolation(format!(
                        "thought '{}' is tracked in more than one place",
                        thought.thought_id
                    )));
                }
            }
        }
        Ok(())
    }
}
