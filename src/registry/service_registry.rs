//! # Service Selection Registry
//!
//! Owns every [`ProviderRecord`] for every service type and answers "give me a
//! healthy provider for service type S".
//!
//! Selection walks priority groups in ascending order (0 first). Inside a group
//! only providers whose breaker is available are considered, and the group's
//! strategy picks one of them: FALLBACK takes the first in priority order,
//! ROUND_ROBIN rotates. A group with nothing available falls through to the
//! next group. When no group yields a provider the result is
//! [`SelectionOutcome::Unavailable`], a value the caller degrades on.
//!
//! Records are only ever added or updated, never removed.

use crate::config::{CircuitBreakerSettings, RuntimeControlConfig};
use crate::logging::log_registry_operation;
use crate::registry::{
    Priority, ProviderInfo, ProviderRecord, ProviderRegistration, ProviderSettings,
    RegistryError, SelectionStrategy, ServiceType,
};
use crate::resilience::CircuitBreakerStatus;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of a selection request
#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    Selected(Arc<ProviderRecord>),
    /// No registered provider of the type is currently selectable
    Unavailable {
        service_type: ServiceType,
        providers_considered: usize,
    },
}

impl SelectionOutcome {
    pub fn provider(&self) -> Option<&Arc<ProviderRecord>> {
        match self {
            SelectionOutcome::Selected(provider) => Some(provider),
            SelectionOutcome::Unavailable { .. } => None,
        }
    }

    pub fn into_provider(self) -> Option<Arc<ProviderRecord>> {
        match self {
            SelectionOutcome::Selected(provider) => Some(provider),
            SelectionOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, SelectionOutcome::Selected(_))
    }
}

/// Validated priority change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityUpdate {
    pub priority: Priority,
    /// Unchanged when `None`
    pub priority_group: Option<u32>,
    /// Unchanged when `None`
    pub strategy: Option<SelectionStrategy>,
}

/// Raw priority change as received from an admin caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityUpdateRequest {
    pub priority: String,
    #[serde(default)]
    pub priority_group: Option<i64>,
    #[serde(default)]
    pub strategy: Option<String>,
}

impl PriorityUpdateRequest {
    pub fn validate(&self) -> Result<PriorityUpdate, RegistryError> {
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|message| RegistryError::invalid_field("priority", message))?;

        let priority_group = self
            .priority_group
            .map(|group| {
                u32::try_from(group).map_err(|_| {
                    RegistryError::invalid_field(
                        "priority_group",
                        format!("Invalid priority group '{group}'. Must be a non-negative integer"),
                    )
                })
            })
            .transpose()?;

        let strategy = self
            .strategy
            .as_deref()
            .map(|s| {
                s.parse::<SelectionStrategy>()
                    .map_err(|message| RegistryError::invalid_field("strategy", message))
            })
            .transpose()?;

        Ok(PriorityUpdate {
            priority,
            priority_group,
            strategy,
        })
    }
}

/// Before/after record of a priority update, for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityChange {
    pub provider_name: String,
    pub service_type: ServiceType,
    pub old: ProviderSettings,
    pub new: ProviderSettings,
}

/// Result of a manual breaker reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerReset {
    pub service_type: Option<ServiceType>,
    pub reset_count: usize,
    pub providers_reset: Vec<String>,
    pub message: String,
}

pub struct ServiceSelectionRegistry {
    providers: DashMap<String, Arc<ProviderRecord>>,
    by_type: DashMap<ServiceType, Vec<Arc<ProviderRecord>>>,
    /// Next rotation position per (service type, priority group)
    rotation: DashMap<(ServiceType, u32), usize>,
    breaker_settings: CircuitBreakerSettings,
    required_service_types: Vec<ServiceType>,
    next_registration: AtomicU64,
}

impl std::fmt::Debug for ServiceSelectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSelectionRegistry")
            .field("providers", &self.providers.len())
            .field("required_service_types", &self.required_service_types)
            .finish()
    }
}

impl Default for ServiceSelectionRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerSettings::default())
    }
}

impl ServiceSelectionRegistry {
    pub fn new(breaker_settings: CircuitBreakerSettings) -> Self {
        Self {
            providers: DashMap::new(),
            by_type: DashMap::new(),
            rotation: DashMap::new(),
            breaker_settings,
            required_service_types: Vec::new(),
            next_registration: AtomicU64::new(0),
        }
    }

    /// Build a registry and register every configured provider
    pub fn from_config(config: &RuntimeControlConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new(config.circuit_breakers.clone());
        registry.required_service_types = config.registry.required_service_types.clone();

        for registration in &config.registry.providers {
            registry.register(registration.clone())?;
        }

        info!(
            providers = registry.len(),
            required_service_types = ?registry.required_service_types,
            "📚 Service selection registry initialized"
        );
        Ok(registry)
    }

    pub fn breaker_settings(&self) -> &CircuitBreakerSettings {
        &self.breaker_settings
    }

    pub fn required_service_types(&self) -> &[ServiceType] {
        &self.required_service_types
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Add a provider. Names are unique across all service types.
    pub fn register(
        &self,
        registration: ProviderRegistration,
    ) -> Result<Arc<ProviderRecord>, RegistryError> {
        let record = match self.providers.entry(registration.name.clone()) {
            Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateProvider {
                    name: registration.name,
                })
            }
            Entry::Vacant(slot) => {
                let breaker_config = self.breaker_settings.config_for_provider(&registration.name);
                let order = self.next_registration.fetch_add(1, Ordering::Relaxed);
                let record = Arc::new(ProviderRecord::new(registration, breaker_config, order));
                slot.insert(Arc::clone(&record));
                record
            }
        };

        self.by_type
            .entry(record.service_type())
            .or_default()
            .push(Arc::clone(&record));

        let details = format!(
            "priority={} group={} strategy={}",
            record.priority(),
            record.priority_group(),
            record.strategy()
        );
        log_registry_operation(
            "register",
            Some(record.service_type().as_str()),
            Some(record.name()),
            "registered",
            Some(&details),
        );

        Ok(record)
    }

    pub fn provider(&self, name: &str) -> Option<Arc<ProviderRecord>> {
        self.providers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// All providers of a type in registration order
    pub fn providers_for(&self, service_type: ServiceType) -> Vec<Arc<ProviderRecord>> {
        self.by_type
            .get(&service_type)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Providers grouped by priority group (ascending), each group sorted by
    /// priority value then registration order. Settings are read once per
    /// provider so a concurrent update cannot reorder a group mid-scan.
    fn ranked_groups(
        &self,
        service_type: ServiceType,
        required_capabilities: &[String],
    ) -> BTreeMap<u32, Vec<(Arc<ProviderRecord>, ProviderSettings)>> {
        let mut groups: BTreeMap<u32, Vec<(Arc<ProviderRecord>, ProviderSettings)>> =
            BTreeMap::new();

        for provider in self.providers_for(service_type) {
            if !provider.has_capabilities(required_capabilities) {
                continue;
            }
            let settings = provider.settings();
            groups
                .entry(settings.priority_group)
                .or_default()
                .push((provider, settings));
        }

        for members in groups.values_mut() {
            members.sort_by_key(|(provider, settings)| {
                (settings.priority, provider.registration_order())
            });
        }

        groups
    }

    /// Select a provider for a service type
    pub fn select(&self, service_type: ServiceType) -> SelectionOutcome {
        self.select_with_capabilities(service_type, &[])
    }

    /// Select a provider that has every required capability
    pub fn select_with_capabilities(
        &self,
        service_type: ServiceType,
        required_capabilities: &[String],
    ) -> SelectionOutcome {
        let groups = self.ranked_groups(service_type, required_capabilities);
        let providers_considered = groups.values().map(Vec::len).sum();

        for (group, members) in &groups {
            // Group strategy comes from its highest-ranked member
            let strategy = members[0].1.strategy;
            let chosen = match strategy {
                SelectionStrategy::Fallback => members
                    .iter()
                    .find(|(provider, _)| provider.is_available())
                    .map(|(provider, _)| Arc::clone(provider)),
                SelectionStrategy::RoundRobin => {
                    self.next_in_rotation(service_type, *group, members)
                }
            };

            if let Some(provider) = chosen {
                debug!(
                    service_type = %service_type,
                    provider = %provider.name(),
                    priority_group = group,
                    strategy = %strategy,
                    "Provider selected"
                );
                return SelectionOutcome::Selected(provider);
            }

            debug!(
                service_type = %service_type,
                priority_group = group,
                "No available provider in group, falling through"
            );
        }

        warn!(
            service_type = %service_type,
            providers_considered = providers_considered,
            "⚠️ No provider available"
        );
        SelectionOutcome::Unavailable {
            service_type,
            providers_considered,
        }
    }

    /// Advance the group's rotation past the first available member at or
    /// after the cursor. The cursor only moves on a successful pick.
    fn next_in_rotation(
        &self,
        service_type: ServiceType,
        group: u32,
        members: &[(Arc<ProviderRecord>, ProviderSettings)],
    ) -> Option<Arc<ProviderRecord>> {
        let len = members.len();
        let mut cursor = self.rotation.entry((service_type, group)).or_insert(0);
        let start = *cursor % len;

        for offset in 0..len {
            let index = (start + offset) % len;
            let (provider, _) = &members[index];
            if provider.is_available() {
                *cursor = (index + 1) % len;
                return Some(Arc::clone(provider));
            }
        }

        None
    }

    /// Every currently available provider in selection order (groups ascending,
    /// then priority). Does not advance any rotation.
    pub fn select_all(&self, service_type: ServiceType) -> Vec<Arc<ProviderRecord>> {
        self.ranked_groups(service_type, &[])
            .into_values()
            .flatten()
            .filter(|(provider, _)| provider.is_available())
            .map(|(provider, _)| provider)
            .collect()
    }

    /// Route a call outcome to the provider's breaker
    pub fn report_outcome(&self, provider_name: &str, success: bool) -> Result<(), RegistryError> {
        let provider = self.provider(provider_name).ok_or_else(|| {
            warn!(provider = %provider_name, "Outcome reported for unknown provider");
            RegistryError::UnknownProvider {
                name: provider_name.to_string(),
            }
        })?;

        if success {
            provider.circuit_breaker().report_success();
        } else {
            provider.circuit_breaker().report_failure();
        }
        Ok(())
    }

    /// Change a provider's priority, and optionally its group and strategy
    pub fn update_priority(
        &self,
        provider_name: &str,
        update: PriorityUpdate,
    ) -> Result<PriorityChange, RegistryError> {
        let provider = self
            .provider(provider_name)
            .ok_or_else(|| RegistryError::UnknownProvider {
                name: provider_name.to_string(),
            })?;

        let current = provider.settings();
        let new = ProviderSettings {
            priority: update.priority,
            priority_group: update.priority_group.unwrap_or(current.priority_group),
            strategy: update.strategy.unwrap_or(current.strategy),
        };
        let old = provider.replace_settings(new);

        let details = format!(
            "priority {} -> {}, group {} -> {}, strategy {} -> {}",
            old.priority,
            new.priority,
            old.priority_group,
            new.priority_group,
            old.strategy,
            new.strategy
        );
        log_registry_operation(
            "update_priority",
            Some(provider.service_type().as_str()),
            Some(provider_name),
            "updated",
            Some(&details),
        );

        Ok(PriorityChange {
            provider_name: provider_name.to_string(),
            service_type: provider.service_type(),
            old,
            new,
        })
    }

    /// Reset breakers for one service type, or for every provider
    pub fn reset_circuit_breakers(&self, service_type: Option<ServiceType>) -> CircuitBreakerReset {
        let targets: Vec<Arc<ProviderRecord>> = match service_type {
            Some(service_type) => self.providers_for(service_type),
            None => {
                let mut all: Vec<_> = self
                    .providers
                    .iter()
                    .map(|entry| Arc::clone(entry.value()))
                    .collect();
                all.sort_by_key(|provider| provider.registration_order());
                all
            }
        };

        for provider in &targets {
            provider.circuit_breaker().reset();
        }

        let providers_reset: Vec<String> =
            targets.iter().map(|p| p.name().to_string()).collect();
        let reset_count = providers_reset.len();
        let message = match service_type {
            Some(service_type) => {
                format!("Reset {reset_count} circuit breakers for {service_type} services")
            }
            None => format!("Reset all {reset_count} circuit breakers"),
        };

        log_registry_operation(
            "reset_circuit_breakers",
            service_type.as_ref().map(ServiceType::as_str),
            None,
            "reset",
            Some(&message),
        );

        CircuitBreakerReset {
            service_type,
            reset_count,
            providers_reset,
            message,
        }
    }

    /// Provider descriptions keyed by service type name
    pub fn provider_info(&self) -> BTreeMap<String, Vec<ProviderInfo>> {
        let mut info = BTreeMap::new();
        for service_type in ServiceType::ALL {
            let providers = self.providers_for(service_type);
            if !providers.is_empty() {
                info.insert(
                    service_type.to_string(),
                    providers.iter().map(|p| p.info()).collect(),
                );
            }
        }
        info
    }

    /// Breaker status keyed by provider name
    pub fn circuit_breaker_status(
        &self,
        service_type: Option<ServiceType>,
    ) -> BTreeMap<String, CircuitBreakerStatus> {
        self.providers
            .iter()
            .filter(|entry| service_type.map_or(true, |t| entry.value().service_type() == t))
            .map(|entry| (entry.key().clone(), entry.value().circuit_breaker().status()))
            .collect()
    }

    /// True when every required service type has at least one available provider
    pub fn is_ready(&self) -> bool {
        self.required_service_types
            .iter()
            .all(|service_type| !self.select_all(*service_type).is_empty())
    }

    /// Poll until ready or until `timeout` elapses
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        const POLL_INTERVAL: Duration = Duration::from_millis(50);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.is_ready() {
                info!("✅ All required service types have available providers");
                return true;
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                let missing: Vec<&str> = self
                    .required_service_types
                    .iter()
                    .filter(|service_type| self.select_all(**service_type).is_empty())
                    .map(ServiceType::as_str)
                    .collect();
                warn!(missing = ?missing, "⏰ Timed out waiting for required services");
                return false;
            }

            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{CircuitBreakerConfig, CircuitState};

    fn registry() -> ServiceSelectionRegistry {
        let settings = CircuitBreakerSettings {
            default_config: CircuitBreakerConfig::new(2, Duration::from_secs(60)),
            component_configs: Default::default(),
        };
        ServiceSelectionRegistry::new(settings)
    }

    fn llm(name: &str) -> ProviderRegistration {
        ProviderRegistration::new(name, ServiceType::Llm)
    }

    fn selected_name(outcome: SelectionOutcome) -> String {
        outcome
            .into_provider()
            .map(|p| p.name().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_fallback_prefers_priority_then_registration_order() {
        let registry = registry();
        registry.register(llm("normal_a")).unwrap();
        registry
            .register(llm("high").with_priority(Priority::High))
            .unwrap();
        registry.register(llm("normal_b")).unwrap();

        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "high");

        registry.provider("high").unwrap().circuit_breaker().force_open();
        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "normal_a");
    }

    #[test]
    fn test_same_group_fallthrough_before_next_group() {
        let registry = registry();
        registry
            .register(llm("p1").with_priority(Priority::High))
            .unwrap();
        registry.register(llm("p2")).unwrap();
        registry.register(llm("p3").in_group(1)).unwrap();

        registry.provider("p1").unwrap().circuit_breaker().force_open();
        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "p2");

        registry.provider("p2").unwrap().circuit_breaker().force_open();
        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "p3");
    }

    #[test]
    fn test_unavailable_is_a_value() {
        let registry = registry();
        match registry.select(ServiceType::Memory) {
            SelectionOutcome::Unavailable {
                service_type,
                providers_considered,
            } => {
                assert_eq!(service_type, ServiceType::Memory);
                assert_eq!(providers_considered, 0);
            }
            SelectionOutcome::Selected(p) => panic!("unexpected provider {}", p.name()),
        }

        registry.register(llm("only")).unwrap();
        registry.provider("only").unwrap().circuit_breaker().force_open();
        let outcome = registry.select(ServiceType::Llm);
        assert!(!outcome.is_selected());
    }

    #[test]
    fn test_round_robin_rotates_and_skips_unavailable() {
        let registry = registry();
        for name in ["a", "b", "c"] {
            registry
                .register(llm(name).with_strategy(SelectionStrategy::RoundRobin))
                .unwrap();
        }

        let picks: Vec<String> = (0..6)
            .map(|_| selected_name(registry.select(ServiceType::Llm)))
            .collect();
        assert_eq!(picks, vec!["a", "b", "c", "a", "b", "c"]);

        registry.provider("b").unwrap().circuit_breaker().force_open();
        let picks: Vec<String> = (0..4)
            .map(|_| selected_name(registry.select(ServiceType::Llm)))
            .collect();
        assert_eq!(picks, vec!["a", "c", "a", "c"]);
    }

    #[test]
    fn test_rotation_does_not_advance_when_group_empty() {
        let registry = registry();
        for name in ["a", "b"] {
            registry
                .register(llm(name).with_strategy(SelectionStrategy::RoundRobin))
                .unwrap();
        }
        registry.register(llm("backup").in_group(1)).unwrap();

        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "a");
        registry.provider("a").unwrap().circuit_breaker().force_open();
        registry.provider("b").unwrap().circuit_breaker().force_open();
        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "backup");

        registry.reset_circuit_breakers(Some(ServiceType::Llm));
        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "b");
    }

    #[test]
    fn test_capability_filter() {
        let registry = registry();
        registry
            .register(llm("plain").with_priority(Priority::Critical))
            .unwrap();
        registry
            .register(llm("structured").with_capabilities(["call_llm_structured"]))
            .unwrap();

        let outcome = registry
            .select_with_capabilities(ServiceType::Llm, &["call_llm_structured".to_string()]);
        assert_eq!(selected_name(outcome), "structured");
        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "plain");
    }

    #[test]
    fn test_report_outcome_trips_breaker_and_rejects_unknown() {
        let registry = registry();
        registry.register(llm("flaky")).unwrap();

        registry.report_outcome("flaky", false).unwrap();
        registry.report_outcome("flaky", false).unwrap();
        assert_eq!(
            registry.provider("flaky").unwrap().circuit_breaker().state(),
            CircuitState::Open
        );

        let err = registry.report_outcome("ghost", true).unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownProvider {
                name: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = registry();
        registry.register(llm("dup")).unwrap();
        let err = registry
            .register(ProviderRegistration::new("dup", ServiceType::Memory))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateProvider { .. }));
        assert_eq!(registry.len(), 1);
        assert!(registry.providers_for(ServiceType::Memory).is_empty());
    }

    #[test]
    fn test_update_priority_reports_old_and_new() {
        let registry = registry();
        registry.register(llm("first")).unwrap();
        registry.register(llm("second")).unwrap();

        let change = registry
            .update_priority(
                "second",
                PriorityUpdate {
                    priority: Priority::Critical,
                    priority_group: None,
                    strategy: Some(SelectionStrategy::RoundRobin),
                },
            )
            .unwrap();

        assert_eq!(change.old.priority, Priority::Normal);
        assert_eq!(change.new.priority, Priority::Critical);
        assert_eq!(change.new.priority_group, 0);
        assert_eq!(change.new.strategy, SelectionStrategy::RoundRobin);
        assert_eq!(change.service_type, ServiceType::Llm);
        assert_eq!(selected_name(registry.select(ServiceType::Llm)), "second");
    }

    #[test]
    fn test_priority_request_validation() {
        let ok = PriorityUpdateRequest {
            priority: "low".to_string(),
            priority_group: Some(2),
            strategy: Some("round_robin".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.priority, Priority::Low);
        assert_eq!(ok.priority_group, Some(2));
        assert_eq!(ok.strategy, Some(SelectionStrategy::RoundRobin));

        let bad_priority = PriorityUpdateRequest {
            priority: "URGENT".to_string(),
            priority_group: None,
            strategy: None,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(bad_priority, RegistryError::InvalidField { ref field, .. } if field == "priority"));

        let bad_group = PriorityUpdateRequest {
            priority: "HIGH".to_string(),
            priority_group: Some(-1),
            strategy: None,
        }
        .validate()
        .unwrap_err();
        assert!(bad_group.to_string().contains("priority_group"));

        let bad_strategy = PriorityUpdateRequest {
            priority: "HIGH".to_string(),
            priority_group: None,
            strategy: Some("random".to_string()),
        }
        .validate()
        .unwrap_err();
        assert!(bad_strategy.to_string().contains("'random'"));
    }

    #[test]
    fn test_reset_scoped_and_global() {
        let registry = registry();
        registry.register(llm("llm_a")).unwrap();
        registry
            .register(ProviderRegistration::new("mem_a", ServiceType::Memory))
            .unwrap();
        registry.provider("llm_a").unwrap().circuit_breaker().force_open();
        registry.provider("mem_a").unwrap().circuit_breaker().force_open();

        let scoped = registry.reset_circuit_breakers(Some(ServiceType::Llm));
        assert_eq!(scoped.reset_count, 1);
        assert_eq!(scoped.providers_reset, vec!["llm_a"]);
        assert_eq!(scoped.message, "Reset 1 circuit breakers for llm services");
        assert!(!registry.provider("mem_a").unwrap().is_available());

        let all = registry.reset_circuit_breakers(None);
        assert_eq!(all.reset_count, 2);
        assert_eq!(all.providers_reset, vec!["llm_a", "mem_a"]);
        assert_eq!(all.message, "Reset all 2 circuit breakers");
        assert!(registry.provider("mem_a").unwrap().is_available());
    }

    #[test]
    fn test_select_all_orders_by_group() {
        let registry = registry();
        registry.register(llm("late").in_group(1)).unwrap();
        registry.register(llm("early")).unwrap();
        registry.register(llm("down")).unwrap();
        registry.provider("down").unwrap().circuit_breaker().force_open();

        let names: Vec<String> = registry
            .select_all(ServiceType::Llm)
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_wait_ready() {
        let mut registry = registry();
        registry.required_service_types = vec![ServiceType::Llm];
        assert!(!registry.wait_ready(Duration::from_millis(20)).await);

        registry.register(llm("ready")).unwrap();
        assert!(registry.wait_ready(Duration::from_millis(20)).await);
    }
}
