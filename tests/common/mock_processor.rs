use async_trait::async_trait;
use parking_lot::Mutex;
use runtime_control::pipeline::{
    ConscienceExecutionResult, ConscienceVerdict, StageError, StageProcessor, StepMetadata,
    StepPoint, StepResult, ThoughtInPipeline,
};
use std::collections::{HashMap, HashSet};

/// Stand-in for the cognitive loop. Every stage succeeds unless scripted
/// otherwise.
#[derive(Debug, Default)]
pub struct ScriptedStageProcessor {
    failing: Mutex<HashSet<String>>,
    conscience_rejects: Mutex<HashSet<String>>,
    tokens_per_step: Mutex<HashMap<StepPoint, u64>>,
    calls: Mutex<Vec<(String, StepPoint)>>,
}

impl ScriptedStageProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stage for this thought fails until `recover` is called
    pub fn fail_thought(&self, thought_id: &str) {
        self.failing.lock().insert(thought_id.to_string());
    }

    pub fn recover(&self, thought_id: &str) {
        self.failing.lock().remove(thought_id);
    }

    /// Conscience checks for this thought fail
    pub fn reject_conscience(&self, thought_id: &str) {
        self.conscience_rejects.lock().insert(thought_id.to_string());
    }

    pub fn tokens_for(&self, step: StepPoint, tokens: u64) {
        self.tokens_per_step.lock().insert(step, tokens);
    }

    pub fn calls(&self) -> Vec<(String, StepPoint)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl StageProcessor for ScriptedStageProcessor {
    async fn process_step(
        &self,
        step: StepPoint,
        thought: &ThoughtInPipeline,
    ) -> Result<StepResult, StageError> {
        self.calls.lock().push((thought.thought_id.clone(), step));

        if self.failing.lock().contains(&thought.thought_id) {
            return Err(StageError::new(format!(
                "{step} failed for {}",
                thought.thought_id
            )));
        }

        let tokens = self.tokens_per_step.lock().get(&step).copied();
        let metadata = StepMetadata::new(&thought.thought_id)
            .with_task(&thought.task_id)
            .with_timing(2.0, tokens);

        if step == StepPoint::ConscienceExecution
            && self.conscience_rejects.lock().contains(&thought.thought_id)
        {
            return Ok(StepResult::ConscienceExecution(ConscienceExecutionResult {
                metadata,
                selected_action: "speak".to_string(),
                conscience_passed: false,
                verdicts: vec![ConscienceVerdict {
                    conscience: "epistemic_humility".to_string(),
                    passed: false,
                    reason: Some("overconfident claim".to_string()),
                }],
                override_action: Some("ponder".to_string()),
            }));
        }

        Ok(StepResult::empty(step, metadata))
    }
}
