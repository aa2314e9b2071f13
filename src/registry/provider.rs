//! A registered backend instance and its circuit breaker.

use crate::registry::{Priority, ProviderRegistration, ProviderSettings, SelectionStrategy, ServiceType};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One provider of a service type.
///
/// Identity, capabilities and metadata are fixed at registration. Selection
/// settings sit behind this record's own lock and the breaker is lock-free on
/// its hot paths, so outcome reports for different providers never contend.
#[derive(Debug)]
pub struct ProviderRecord {
    name: String,
    service_type: ServiceType,
    capabilities: Vec<String>,
    metadata: BTreeMap<String, serde_json::Value>,
    registration_order: u64,
    registered_at: DateTime<Utc>,
    settings: RwLock<ProviderSettings>,
    circuit_breaker: CircuitBreaker,
}

impl ProviderRecord {
    pub(crate) fn new(
        registration: ProviderRegistration,
        breaker_config: CircuitBreakerConfig,
        registration_order: u64,
    ) -> Self {
        let settings = ProviderSettings {
            priority: registration.priority,
            priority_group: registration.priority_group,
            strategy: registration.strategy,
        };

        Self {
            circuit_breaker: CircuitBreaker::new(registration.name.clone(), breaker_config),
            name: registration.name,
            service_type: registration.service_type,
            capabilities: registration.capabilities,
            metadata: registration.metadata,
            registration_order,
            registered_at: Utc::now(),
            settings: RwLock::new(settings),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn registration_order(&self) -> u64 {
        self.registration_order
    }

    /// Copy of the current selection settings
    pub fn settings(&self) -> ProviderSettings {
        *self.settings.read()
    }

    pub fn priority(&self) -> Priority {
        self.settings.read().priority
    }

    pub fn priority_group(&self) -> u32 {
        self.settings.read().priority_group
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.settings.read().strategy
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Breaker allows selection (may move an expired Open breaker to Half-Open)
    pub fn is_available(&self) -> bool {
        self.circuit_breaker.is_available()
    }

    pub fn has_capabilities(&self, required: &[String]) -> bool {
        required.iter().all(|cap| self.capabilities.contains(cap))
    }

    /// Apply new settings and return the previous ones
    pub(crate) fn replace_settings(&self, new_settings: ProviderSettings) -> ProviderSettings {
        let mut settings = self.settings.write();
        std::mem::replace(&mut *settings, new_settings)
    }

    pub fn info(&self) -> ProviderInfo {
        let settings = self.settings();
        ProviderInfo {
            name: self.name.clone(),
            service_type: self.service_type,
            priority: settings.priority,
            priority_value: settings.priority.value(),
            priority_group: settings.priority_group,
            strategy: settings.strategy,
            capabilities: self.capabilities.clone(),
            metadata: self.metadata.clone(),
            circuit_breaker_state: self.circuit_breaker.state(),
            registered_at: self.registered_at,
        }
    }
}

/// Serializable description of a provider for operator tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub service_type: ServiceType,
    pub priority: Priority,
    pub priority_value: u8,
    pub priority_group: u32,
    pub strategy: SelectionStrategy,
    pub capabilities: Vec<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub circuit_breaker_state: CircuitState,
    pub registered_at: DateTime<Utc>,
}
