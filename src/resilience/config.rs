//! # Circuit Breaker Configuration
//!
//! Per-breaker thresholds. System-wide defaults and per-provider overrides live
//! in [`crate::config::CircuitBreakerSettings`].

use crate::constants::circuit_breaker::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT_SECONDS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a single circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds to stay open before moving to half-open
    #[serde(default = "default_reset_timeout_seconds")]
    pub reset_timeout_seconds: f64,
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_reset_timeout_seconds() -> f64 {
    DEFAULT_RESET_TIMEOUT_SECONDS
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout_seconds: reset_timeout.as_secs_f64(),
        }
    }

    /// Reset timeout as a `Duration`. Invalid values collapse to zero; `validate`
    /// is where they get rejected.
    pub fn reset_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.reset_timeout_seconds).unwrap_or(Duration::ZERO)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be greater than 0".to_string());
        }

        if self.failure_threshold > 100 {
            return Err("failure_threshold should not exceed 100".to_string());
        }

        if !self.reset_timeout_seconds.is_finite() || self.reset_timeout_seconds <= 0.0 {
            return Err("reset_timeout_seconds must be a positive number".to_string());
        }

        if self.reset_timeout_seconds > 3600.0 {
            return Err("reset_timeout_seconds should not exceed 3600".to_string());
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout_seconds: DEFAULT_RESET_TIMEOUT_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_five_failures_thirty_seconds() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.reset_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_threshold = CircuitBreakerConfig {
            failure_threshold: 0,
            ..Default::default()
        };
        assert!(zero_threshold.validate().is_err());

        for timeout in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = CircuitBreakerConfig {
                reset_timeout_seconds: timeout,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "timeout {timeout} accepted");
            assert_eq!(config.reset_timeout(), Duration::ZERO);
        }
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: CircuitBreakerConfig = serde_yaml::from_str("failure_threshold: 2").unwrap();
        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.reset_timeout_seconds, 30.0);
    }
}
