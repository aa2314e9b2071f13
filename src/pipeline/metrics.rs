use crate::pipeline::StepPoint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Processing counters reported alongside single-step results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Summed stage time across every successful step
    pub total_processing_time_ms: f64,
    pub tokens_used: u64,
    /// Summed stage time per step point
    pub step_timings: BTreeMap<StepPoint, f64>,
    pub steps_processed: u64,
    pub steps_failed: u64,
    pub thoughts_completed: u64,
    /// Mean pipeline time of recently completed thoughts
    pub average_thought_time_ms: f64,
    pub single_steps: u64,
    pub pause_resume_cycles: u64,
}

impl ProcessingMetrics {
    /// Seconds per completed thought, if any thought has completed
    pub fn seconds_per_thought(&self) -> Option<f64> {
        (self.thoughts_completed > 0 && self.average_thought_time_ms > 0.0)
            .then(|| self.average_thought_time_ms / 1000.0)
    }
}

/// Accumulates [`ProcessingMetrics`] with a bounded completed-thought history
#[derive(Debug)]
pub(crate) struct MetricsRecorder {
    metrics: ProcessingMetrics,
    thought_times: VecDeque<f64>,
    max_history: usize,
}

impl MetricsRecorder {
    pub(crate) fn new(max_history: usize) -> Self {
        Self {
            metrics: ProcessingMetrics::default(),
            thought_times: VecDeque::with_capacity(max_history),
            max_history: max_history.max(1),
        }
    }

    pub(crate) fn record_step(&mut self, step: StepPoint, elapsed_ms: f64, tokens: Option<u64>) {
        self.metrics.steps_processed += 1;
        self.metrics.total_processing_time_ms += elapsed_ms;
        *self.metrics.step_timings.entry(step).or_insert(0.0) += elapsed_ms;
        if let Some(tokens) = tokens {
            self.metrics.tokens_used = self.metrics.tokens_used.saturating_add(tokens);
        }
    }

    pub(crate) fn record_failure(&mut self) {
        self.metrics.steps_failed += 1;
    }

    pub(crate) fn record_thought_completed(&mut self, thought_time_ms: f64) {
        self.metrics.thoughts_completed += 1;
        if self.thought_times.len() == self.max_history {
            self.thought_times.pop_front();
        }
        self.thought_times.push_back(thought_time_ms);
        self.metrics.average_thought_time_ms =
            self.thought_times.iter().sum::<f64>() / self.thought_times.len() as f64;
    }

    pub(crate) fn record_single_step(&mut self) {
        self.metrics.single_steps += 1;
    }

    pub(crate) fn record_pause_resume_cycle(&mut self) {
        self.metrics.pause_resume_cycles += 1;
    }

    pub(crate) fn snapshot(&self) -> ProcessingMetrics {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_step_accumulates_per_step() {
        let mut recorder = MetricsRecorder::new(10);
        recorder.record_step(StepPoint::GatherContext, 12.0, Some(5));
        recorder.record_step(StepPoint::GatherContext, 8.0, None);
        recorder.record_step(StepPoint::PerformDmas, 30.0, Some(100));
        recorder.record_failure();

        let metrics = recorder.snapshot();
        assert_eq!(metrics.steps_processed, 3);
        assert_eq!(metrics.steps_failed, 1);
        assert_eq!(metrics.tokens_used, 105);
        assert_eq!(metrics.total_processing_time_ms, 50.0);
        assert_eq!(metrics.step_timings[&StepPoint::GatherContext], 20.0);
    }

    #[test]
    fn test_token_total_saturates() {
        let mut recorder = MetricsRecorder::new(10);
        recorder.record_step(StepPoint::PerformDmas, 1.0, Some(u64::MAX));
        recorder.record_step(StepPoint::PerformDmas, 1.0, Some(u64::MAX));

        let metrics = recorder.snapshot();
        assert_eq!(metrics.tokens_used, u64::MAX);
        assert_eq!(metrics.steps_processed, 2);
    }

    #[test]
    fn test_average_uses_bounded_history() {
        let mut recorder = MetricsRecorder::new(2);
        recorder.record_thought_completed(1000.0);
        recorder.record_thought_completed(2000.0);
        recorder.record_thought_completed(4000.0);

        let metrics = recorder.snapshot();
        assert_eq!(metrics.thoughts_completed, 3);
        assert_eq!(metrics.average_thought_time_ms, 3000.0);
        assert_eq!(metrics.seconds_per_thought(), Some(3.0));
    }

    #[test]
    fn test_no_rate_before_first_completion() {
        let recorder = MetricsRecorder::new(5);
        assert_eq!(recorder.snapshot().seconds_per_thought(), None);
    }
}
