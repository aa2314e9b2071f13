//! # Circuit Breaker Status
//!
//! Serializable snapshots of breaker state for operator tooling.

use crate::resilience::CircuitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of one provider's circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerStatus {
    /// Provider the breaker guards
    pub service_name: String,

    pub state: CircuitState,

    pub consecutive_failures: u64,

    /// Failures reported since creation or the last reset
    pub failure_count: u64,

    /// Successes reported since creation or the last reset
    pub success_count: u64,

    pub total_calls: u64,

    pub failure_threshold: u32,

    pub reset_timeout_seconds: f64,

    /// Set while Open or Half-Open
    pub opened_at: Option<DateTime<Utc>>,

    pub last_failure_time: Option<DateTime<Utc>>,

    pub last_success_time: Option<DateTime<Utc>>,
}

impl CircuitBreakerStatus {
    /// Failure rate over all recorded calls (0.0 to 1.0)
    pub fn failure_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.failure_count as f64 / self.total_calls as f64
    }

    /// Success rate over all recorded calls (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.success_count as f64 / self.total_calls as f64
    }

    /// Only a closed breaker counts as healthy
    pub fn is_healthy(&self) -> bool {
        self.state == CircuitState::Closed
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Skipped by selection",
            CircuitState::HalfOpen => "Recovering - Next call decides",
        }
    }

    /// Format status for logging
    pub fn format_summary(&self) -> String {
        format!(
            "{}: {} | Calls: {} | Success: {:.1}% | Consecutive failures: {}/{}",
            self.service_name,
            self.state_description(),
            self.total_calls,
            self.success_rate() * 100.0,
            self.consecutive_failures,
            self.failure_threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: CircuitState, success: u64, failure: u64) -> CircuitBreakerStatus {
        CircuitBreakerStatus {
            service_name: "openai_primary".to_string(),
            state,
            consecutive_failures: 0,
            failure_count: failure,
            success_count: success,
            total_calls: success + failure,
            failure_threshold: 5,
            reset_timeout_seconds: 30.0,
            opened_at: None,
            last_failure_time: None,
            last_success_time: None,
        }
    }

    #[test]
    fn test_rates() {
        let s = status(CircuitState::Closed, 3, 1);
        assert_eq!(s.failure_rate(), 0.25);
        assert_eq!(s.success_rate(), 0.75);

        let empty = status(CircuitState::Closed, 0, 0);
        assert_eq!(empty.failure_rate(), 0.0);
    }

    #[test]
    fn test_health_and_summary() {
        assert!(status(CircuitState::Closed, 0, 0).is_healthy());
        assert!(!status(CircuitState::HalfOpen, 0, 0).is_healthy());

        let summary = status(CircuitState::Open, 1, 1).format_summary();
        assert!(summary.starts_with("openai_primary: Failing"));
        assert!(summary.contains("50.0%"));
    }

    #[test]
    fn test_serializes_state_as_snake_case() {
        let json = serde_json::to_value(status(CircuitState::HalfOpen, 0, 0)).unwrap();
        assert_eq!(json["state"], "half_open");
        assert!(json["opened_at"].is_null());
    }
}
