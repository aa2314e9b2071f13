use serde::{Deserialize, Serialize};
use std::fmt;

/// Named pipeline stages in their fixed processing order.
///
/// The derived `Ord` follows declaration order, which is the pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPoint {
    /// Build the system snapshot and thought context
    GatherContext,
    /// Run the ethical, common-sense and domain DMAs
    PerformDmas,
    /// Select an action from the DMA results
    PerformAspdma,
    /// Check the selected action against the consciences
    ConscienceExecution,
    /// Dispatch the action and finish the thought
    ActionComplete,
}

impl StepPoint {
    pub const ALL: [StepPoint; 5] = [
        StepPoint::GatherContext,
        StepPoint::PerformDmas,
        StepPoint::PerformAspdma,
        StepPoint::ConscienceExecution,
        StepPoint::ActionComplete,
    ];

    /// Stage after this one; `None` for the last stage
    pub fn next(&self) -> Option<StepPoint> {
        match self {
            Self::GatherContext => Some(Self::PerformDmas),
            Self::PerformDmas => Some(Self::PerformAspdma),
            Self::PerformAspdma => Some(Self::ConscienceExecution),
            Self::ConscienceExecution => Some(Self::ActionComplete),
            Self::ActionComplete => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::ActionComplete)
    }

    /// Zero-based position in the pipeline
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GatherContext => "gather_context",
            Self::PerformDmas => "perform_dmas",
            Self::PerformAspdma => "perform_aspdma",
            Self::ConscienceExecution => "conscience_execution",
            Self::ActionComplete => "action_complete",
        }
    }

    /// Whether `self → to` is a legal move for a thought: one step forward, or
    /// the conscience-failure return to action selection
    pub fn can_transition_to(&self, to: StepPoint) -> bool {
        self.next() == Some(to) || (*self == Self::ConscienceExecution && to == Self::PerformAspdma)
    }
}

impl fmt::Display for StepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepPoint {
    type Err = String;

    /// Accepts `gather_context` as well as `GATHER_CONTEXT`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        StepPoint::ALL
            .into_iter()
            .find(|step| step.as_str() == normalized)
            .ok_or_else(|| format!("Invalid step point: {s}"))
    }
}
