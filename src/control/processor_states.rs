use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level cognitive states of the agent processor. These are not pipeline
/// steps; a thought moves through every step inside whichever state is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CognitiveState {
    Wakeup,
    Work,
    Play,
    Solitude,
    Dream,
    Shutdown,
}

impl CognitiveState {
    pub const ALL: [CognitiveState; 6] = [
        CognitiveState::Wakeup,
        CognitiveState::Work,
        CognitiveState::Play,
        CognitiveState::Solitude,
        CognitiveState::Dream,
        CognitiveState::Shutdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wakeup => "WAKEUP",
            Self::Work => "WORK",
            Self::Play => "PLAY",
            Self::Solitude => "SOLITUDE",
            Self::Dream => "DREAM",
            Self::Shutdown => "SHUTDOWN",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Wakeup => "Initial state for identity confirmation and system initialization",
            Self::Work => "Normal task processing and interaction state",
            Self::Play => "Creative exploration and experimentation state",
            Self::Solitude => "Quiet reflection and planning state",
            Self::Dream => "Deep introspection and memory consolidation state",
            Self::Shutdown => "Graceful shutdown and cleanup state",
        }
    }

    pub fn capabilities(&self) -> &'static [&'static str] {
        match self {
            Self::Wakeup => &["identity_confirmation", "system_checks", "initial_setup"],
            Self::Work => &[
                "task_processing",
                "user_interaction",
                "tool_usage",
                "memory_operations",
            ],
            Self::Play => &["creative_tasks", "exploration", "learning", "experimentation"],
            Self::Solitude => &["planning", "reflection", "goal_setting", "strategy_development"],
            Self::Dream => &["memory_consolidation", "pattern_analysis", "self_reflection"],
            Self::Shutdown => &[
                "cleanup",
                "final_messages",
                "state_persistence",
                "resource_release",
            ],
        }
    }
}

impl fmt::Display for CognitiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CognitiveState {
    type Err = String;

    /// Accepts `WORK`, `work` and enum-qualified forms such as `AgentState.WORK`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.rsplit('.').next().unwrap_or(s).trim();
        CognitiveState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("Unknown cognitive state: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStateInfo {
    pub name: String,
    pub is_active: bool,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// Every cognitive state, with the active one flagged. An unrecognized active
/// name flags nothing.
pub fn processor_state_catalogue(active: Option<&str>) -> Vec<ProcessorStateInfo> {
    let active = active.and_then(|name| name.parse::<CognitiveState>().ok());
    CognitiveState::ALL
        .into_iter()
        .map(|state| ProcessorStateInfo {
            name: state.as_str().to_string(),
            is_active: active == Some(state),
            description: state.description().to_string(),
            capabilities: state
                .capabilities()
                .iter()
                .map(|c| c.to_string())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_names(active: Option<&str>) -> Vec<String> {
        processor_state_catalogue(active)
            .into_iter()
            .filter(|s| s.is_active)
            .map(|s| s.name)
            .collect()
    }

    #[test]
    fn test_plain_and_qualified_names_match() {
        assert_eq!(active_names(Some("WORK")), vec!["WORK"]);
        assert_eq!(active_names(Some("AgentState.WORK")), vec!["WORK"]);
        assert_eq!(active_names(Some("agentstate.dream")), vec!["DREAM"]);
    }

    #[test]
    fn test_unknown_or_missing_active_flags_nothing() {
        assert!(active_names(None).is_empty());
        assert!(active_names(Some("AgentState.HIBERNATE")).is_empty());
        assert!(active_names(Some("")).is_empty());
    }

    #[test]
    fn test_catalogue_is_complete() {
        let catalogue = processor_state_catalogue(None);
        assert_eq!(catalogue.len(), 6);
        assert_eq!(catalogue[0].name, "WAKEUP");
        assert!(catalogue
            .iter()
            .all(|s| !s.description.is_empty() && !s.capabilities.is_empty()));
    }
}
