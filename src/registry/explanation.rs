//! Operator-facing descriptions of how selection works and what the registry
//! currently looks like. Nothing here feeds back into selection decisions, and
//! building a report never changes breaker or rotation state.

use crate::registry::{Priority, SelectionStrategy, ServiceSelectionRegistry, ServiceType};
use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionExplanation {
    pub overview: String,
    pub priority_groups: Vec<PriorityGroupExplanation>,
    pub priorities: Vec<PriorityExplanation>,
    pub selection_strategies: Vec<StrategyExplanation>,
    /// Current configuration keyed by service type name
    pub services: BTreeMap<String, Vec<GroupConfiguration>>,
    pub selection_flow: Vec<String>,
    pub circuit_breaker_info: CircuitBreakerExplanation,
    pub examples: Vec<SelectionExample>,
    pub configuration_tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityGroupExplanation {
    pub group: u32,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityExplanation {
    pub name: Priority,
    pub value: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyExplanation {
    pub name: SelectionStrategy,
    pub description: String,
}

/// One priority group of one service type as configured right now
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfiguration {
    pub priority_group: u32,
    /// Strategy of the group's highest-ranked member
    pub strategy: SelectionStrategy,
    pub providers: Vec<ProviderSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub name: String,
    pub priority: Priority,
    pub circuit_breaker_state: CircuitState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerExplanation {
    pub description: String,
    pub default_failure_threshold: u32,
    pub default_reset_timeout_seconds: f64,
    pub states: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionExample {
    pub scenario: String,
    pub outcome: String,
}

fn group_label(group: u32) -> String {
    match group {
        0 => "primary".to_string(),
        1 => "secondary".to_string(),
        2 => "tertiary".to_string(),
        n => format!("tier {n}"),
    }
}

impl ServiceSelectionRegistry {
    /// Structured description of current priority groups, strategies and examples
    pub fn explain_selection(&self) -> SelectionExplanation {
        let mut services = BTreeMap::new();
        let mut groups_in_use = std::collections::BTreeSet::new();

        for service_type in ServiceType::ALL {
            let mut groups: BTreeMap<u32, Vec<_>> = BTreeMap::new();
            for provider in self.providers_for(service_type) {
                let settings = provider.settings();
                groups
                    .entry(settings.priority_group)
                    .or_default()
                    .push((provider, settings));
            }
            if groups.is_empty() {
                continue;
            }

            let configurations = groups
                .into_iter()
                .map(|(group, mut members)| {
                    groups_in_use.insert(group);
                    members.sort_by_key(|(provider, settings)| {
                        (settings.priority, provider.registration_order())
                    });
                    GroupConfiguration {
                        priority_group: group,
                        strategy: members[0].1.strategy,
                        providers: members
                            .iter()
                            .map(|(provider, settings)| ProviderSummary {
                                name: provider.name().to_string(),
                                priority: settings.priority,
                                circuit_breaker_state: provider.circuit_breaker().state(),
                            })
                            .collect(),
                    }
                })
                .collect();
            services.insert(service_type.to_string(), configurations);
        }

        if groups_in_use.is_empty() {
            groups_in_use.extend([0, 1, 2]);
        }

        let defaults = &self.breaker_settings().default_config;

        SelectionExplanation {
            overview: "Providers are chosen per service type by walking priority groups from \
                       0 upward. Within a group only providers with an available circuit \
                       breaker are eligible, and the group's selection strategy picks among \
                       them. If a group has nothing available, selection falls through to the \
                       next group."
                .to_string(),
            priority_groups: groups_in_use
                .into_iter()
                .map(|group| PriorityGroupExplanation {
                    group,
                    label: group_label(group),
                    description: if group == 0 {
                        "Tried first for every request".to_string()
                    } else {
                        format!("Used only when groups below {group} have no available provider")
                    },
                })
                .collect(),
            priorities: Priority::ALL
                .into_iter()
                .map(|priority| PriorityExplanation {
                    name: priority,
                    value: priority.value(),
                    description: priority.description().to_string(),
                })
                .collect(),
            selection_strategies: SelectionStrategy::ALL
                .into_iter()
                .map(|strategy| StrategyExplanation {
                    name: strategy,
                    description: strategy.description().to_string(),
                })
                .collect(),
            services,
            selection_flow: vec![
                "1. Collect providers registered for the requested service type".to_string(),
                "2. Drop providers missing any required capability".to_string(),
                "3. Group by priority_group and visit groups in ascending order".to_string(),
                "4. Inside a group, order by priority value then registration order".to_string(),
                "5. Skip providers whose circuit breaker is open".to_string(),
                "6. Apply the group strategy (FALLBACK: first eligible, ROUND_ROBIN: next in rotation)"
                    .to_string(),
                "7. If no group yields a provider, report the service as unavailable".to_string(),
            ],
            circuit_breaker_info: CircuitBreakerExplanation {
                description: "Each provider has its own breaker. Consecutive failures open it; \
                              after the reset timeout it turns half-open and is eligible again \
                              until the next reported outcome closes or reopens it."
                    .to_string(),
                default_failure_threshold: defaults.failure_threshold,
                default_reset_timeout_seconds: defaults.reset_timeout_seconds,
                states: BTreeMap::from([
                    (
                        CircuitState::Closed.to_string(),
                        "Normal operation, provider is eligible".to_string(),
                    ),
                    (
                        CircuitState::Open.to_string(),
                        "Too many consecutive failures, provider is skipped".to_string(),
                    ),
                    (
                        CircuitState::HalfOpen.to_string(),
                        "Reset timeout elapsed, the next outcome decides".to_string(),
                    ),
                ]),
            },
            examples: vec![
                SelectionExample {
                    scenario: "Group 0 holds a HIGH and a NORMAL provider with FALLBACK; the HIGH \
                               provider's breaker is open"
                        .to_string(),
                    outcome: "The NORMAL provider in group 0 is selected before group 1 is \
                              considered"
                        .to_string(),
                },
                SelectionExample {
                    scenario: "Group 0 holds three healthy providers with ROUND_ROBIN".to_string(),
                    outcome: "Consecutive selections return each provider once per three calls"
                        .to_string(),
                },
                SelectionExample {
                    scenario: "Every provider in group 0 has an open breaker".to_string(),
                    outcome: "Selection falls through to group 1".to_string(),
                },
                SelectionExample {
                    scenario: "No provider of the service type is available".to_string(),
                    outcome: "Selection reports the service as unavailable and the caller \
                              degrades"
                        .to_string(),
                },
            ],
            configuration_tips: vec![
                "Put the preferred, highest quality providers in group 0".to_string(),
                "Use ROUND_ROBIN for interchangeable providers that should share load".to_string(),
                "Keep a FALLBACK priority provider in a higher group as a last resort".to_string(),
                "Lower failure_threshold for providers whose failures are expensive".to_string(),
                "Reset circuit breakers after fixing a provider instead of waiting out the timeout"
                    .to_string(),
            ],
        }
    }
}
