use crate::registry::{Priority, SelectionStrategy, ServiceSelectionRegistry};
use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealthDetail {
    pub healthy: bool,
    pub circuit_breaker_state: CircuitState,
    pub priority: Priority,
    pub priority_group: u32,
    pub strategy: SelectionStrategy,
}

/// Health of every registered provider, judged by breaker state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealthStatus {
    pub overall_health: OverallHealth,
    pub healthy_services: usize,
    pub unhealthy_services: usize,
    /// Keyed `<service_type>.<provider_name>`
    pub service_details: BTreeMap<String, ServiceHealthDetail>,
    pub recommendations: Vec<String>,
}

impl ServiceSelectionRegistry {
    /// A provider counts as healthy only while its breaker is closed
    pub fn service_health(&self) -> ServiceHealthStatus {
        let mut service_details = BTreeMap::new();
        let mut healthy_services = 0;
        let mut unhealthy_services = 0;

        for (service_type, providers) in self.provider_info() {
            for info in providers {
                let healthy = info.circuit_breaker_state == CircuitState::Closed;
                if healthy {
                    healthy_services += 1;
                } else {
                    unhealthy_services += 1;
                }
                service_details.insert(
                    format!("{service_type}.{}", info.name),
                    ServiceHealthDetail {
                        healthy,
                        circuit_breaker_state: info.circuit_breaker_state,
                        priority: info.priority,
                        priority_group: info.priority_group,
                        strategy: info.strategy,
                    },
                );
            }
        }

        let mut recommendations = Vec::new();
        let overall_health = if unhealthy_services == 0 {
            OverallHealth::Healthy
        } else {
            let overall = if unhealthy_services > healthy_services {
                recommendations
                    .push("Critical: More unhealthy services than healthy ones".to_string());
                OverallHealth::Unhealthy
            } else {
                recommendations.push(format!(
                    "Warning: {unhealthy_services} services are unhealthy"
                ));
                OverallHealth::Degraded
            };
            recommendations
                .push("Consider resetting circuit breakers for failed services".to_string());
            recommendations.push("Check service logs for error details".to_string());
            overall
        };

        ServiceHealthStatus {
            overall_health,
            healthy_services,
            unhealthy_services,
            service_details,
            recommendations,
        }
    }
}
