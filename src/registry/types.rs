//! Registry vocabulary: service types, priorities, selection strategies and the
//! registration record used to add providers.
//!
//! All three enums parse case-insensitively from strings so the same values
//! work in YAML, in admin requests and on the command line.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Logical service a provider implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceType {
    Llm,
    Memory,
    Communication,
    Tool,
    WiseAuthority,
    Audit,
    Telemetry,
    RuntimeControl,
}

impl ServiceType {
    pub const ALL: [ServiceType; 8] = [
        ServiceType::Llm,
        ServiceType::Memory,
        ServiceType::Communication,
        ServiceType::Tool,
        ServiceType::WiseAuthority,
        ServiceType::Audit,
        ServiceType::Telemetry,
        ServiceType::RuntimeControl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Llm => "llm",
            ServiceType::Memory => "memory",
            ServiceType::Communication => "communication",
            ServiceType::Tool => "tool",
            ServiceType::WiseAuthority => "wise_authority",
            ServiceType::Audit => "audit",
            ServiceType::Telemetry => "telemetry",
            ServiceType::RuntimeControl => "runtime_control",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = ServiceType::ALL.iter().map(|t| t.as_str()).collect();
                format!("Invalid service type '{s}'. Valid service types: {valid:?}")
            })
    }
}

impl TryFrom<String> for ServiceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceType> for String {
    fn from(value: ServiceType) -> Self {
        value.as_str().to_string()
    }
}

/// Provider priority within its group. Lower numeric value is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
    Fallback,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Critical,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Fallback,
    ];

    /// Numeric rank used for ordering inside a priority group
    pub fn value(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
            Priority::Fallback => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Normal => "NORMAL",
            Priority::Low => "LOW",
            Priority::Fallback => "FALLBACK",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Priority::Critical => "Always tried first within its group",
            Priority::High => "Preferred providers",
            Priority::Normal => "Standard providers",
            Priority::Low => "Used when higher priorities are unavailable",
            Priority::Fallback => "Last resort within the group",
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value().cmp(&other.value())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
                format!("Invalid priority '{s}'. Valid priorities: {valid:?}")
            })
    }
}

impl TryFrom<String> for Priority {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

/// How a provider is picked among the available members of one priority group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectionStrategy {
    /// First available provider in priority order
    #[default]
    Fallback,
    /// Rotate through available providers
    RoundRobin,
}

impl SelectionStrategy {
    pub const ALL: [SelectionStrategy; 2] =
        [SelectionStrategy::Fallback, SelectionStrategy::RoundRobin];

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::Fallback => "FALLBACK",
            SelectionStrategy::RoundRobin => "ROUND_ROBIN",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SelectionStrategy::Fallback => {
                "Use the first available provider in priority order; later providers only \
                 serve when earlier ones have open circuit breakers"
            }
            SelectionStrategy::RoundRobin => {
                "Rotate through available providers in the group to spread load"
            }
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "FALLBACK" => Ok(SelectionStrategy::Fallback),
            "ROUND_ROBIN" => Ok(SelectionStrategy::RoundRobin),
            _ => {
                let valid: Vec<&str> = SelectionStrategy::ALL.iter().map(|s| s.as_str()).collect();
                Err(format!(
                    "Invalid strategy '{s}'. Valid strategies: {valid:?}"
                ))
            }
        }
    }
}

impl TryFrom<String> for SelectionStrategy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectionStrategy> for String {
    fn from(value: SelectionStrategy) -> Self {
        value.as_str().to_string()
    }
}

/// Everything needed to add a provider to the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRegistration {
    pub name: String,
    pub service_type: ServiceType,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub priority_group: u32,
    #[serde(default)]
    pub strategy: SelectionStrategy,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_priority() -> Priority {
    Priority::Normal
}

impl ProviderRegistration {
    pub fn new(name: impl Into<String>, service_type: ServiceType) -> Self {
        Self {
            name: name.into(),
            service_type,
            priority: Priority::Normal,
            priority_group: 0,
            strategy: SelectionStrategy::Fallback,
            capabilities: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn in_group(mut self, priority_group: u32) -> Self {
        self.priority_group = priority_group;
        self
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Runtime-mutable selection settings of one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub priority: Priority,
    pub priority_group: u32,
    pub strategy: SelectionStrategy,
}
