use thiserror::Error;

/// Rejections and invariant failures from the pipeline step controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Cannot single-step: pipeline is not paused")]
    NotPaused,

    #[error("A single-step tick is already in progress")]
    TickInProgress,

    #[error("Thought '{thought_id}' is not tracked in the pipeline")]
    ThoughtNotTracked { thought_id: String },

    #[error("Thought '{thought_id}' is already tracked or queued")]
    ThoughtAlreadyTracked { thought_id: String },

    #[error("Task '{task_id}' is already queued")]
    TaskAlreadyQueued { task_id: String },

    #[error("Thought '{thought_id}' is not in the thought queue")]
    QueuedThoughtNotFound { thought_id: String },

    /// Internal state no longer satisfies its invariants
    #[error("Pipeline invariant violated: {0}")]
    InvariantViolation(String),
}

impl PipelineError {
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }
}

/// Failure of one stage for one thought, reported by the cognitive loop
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StageError {
    pub message: String,
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
