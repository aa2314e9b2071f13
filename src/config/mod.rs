//! # Runtime Control Configuration
//!
//! YAML-based configuration for the control plane. A single file
//! (`config/runtime-control.yaml`) carries the base settings plus optional
//! `development`/`test`/`production` override blocks that are deep-merged over
//! the base for the active environment.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use runtime_control::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let threshold = manager.config().circuit_breakers.default_config.failure_threshold;
//! let providers = &manager.config().registry.providers;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{control, pipeline};
use crate::registry::{ProviderRegistration, ServiceType};
use crate::resilience::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuntimeControlConfig {
    #[serde(default)]
    pub circuit_breakers: CircuitBreakerSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub control: ControlSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
}

/// Default breaker thresholds plus per-provider overrides keyed by provider name
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CircuitBreakerSettings {
    #[serde(default)]
    pub default_config: CircuitBreakerConfig,
    #[serde(default)]
    pub component_configs: HashMap<String, CircuitBreakerConfig>,
}

impl CircuitBreakerSettings {
    /// Breaker configuration for a provider, falling back to the default
    pub fn config_for_provider(&self, provider_name: &str) -> CircuitBreakerConfig {
        self.component_configs
            .get(provider_name)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineSettings {
    /// Completed-thought durations retained for the rolling average
    #[serde(default = "default_max_thought_history")]
    pub max_thought_history: usize,
    /// How many times a failed conscience check may send a thought back to action selection
    #[serde(default = "default_max_conscience_retries")]
    pub max_conscience_retries: u32,
}

fn default_max_thought_history() -> usize {
    pipeline::DEFAULT_MAX_THOUGHT_HISTORY
}

fn default_max_conscience_retries() -> u32 {
    pipeline::DEFAULT_MAX_CONSCIENCE_RETRIES
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_thought_history: default_max_thought_history(),
            max_conscience_retries: default_max_conscience_retries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlSettings {
    #[serde(default = "default_processor_name")]
    pub processor_name: String,
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    /// Fetch pipeline snapshot and metrics on every single-step, even when the
    /// caller did not ask for details
    #[serde(default = "default_true")]
    pub always_include_step_details: bool,
}

fn default_processor_name() -> String {
    control::DEFAULT_PROCESSOR_NAME.to_string()
}

fn default_max_queue_size() -> usize {
    control::DEFAULT_MAX_QUEUE_SIZE
}

fn default_true() -> bool {
    true
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            processor_name: default_processor_name(),
            max_queue_size: default_max_queue_size(),
            always_include_step_details: true,
        }
    }
}

/// Provider registrations applied at startup
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistrySettings {
    /// Service types that must have an available provider before the registry reports ready
    #[serde(default)]
    pub required_service_types: Vec<ServiceType>,
    #[serde(default)]
    pub providers: Vec<ProviderRegistration>,
}

impl RuntimeControlConfig {
    /// Validate all sections, reporting the first offending field
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.circuit_breakers
            .default_config
            .validate()
            .map_err(|e| {
                ConfigurationError::validation_error(format!(
                    "circuit_breakers.default_config: {e}"
                ))
            })?;

        for (name, config) in &self.circuit_breakers.component_configs {
            config.validate().map_err(|e| {
                ConfigurationError::validation_error(format!(
                    "circuit_breakers.component_configs.{name}: {e}"
                ))
            })?;
        }

        if self.pipeline.max_thought_history == 0 {
            return Err(ConfigurationError::invalid_value(
                "pipeline.max_thought_history",
                "0",
                "must be greater than 0",
            ));
        }

        if self.control.processor_name.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "control.processor_name",
                "control configuration",
            ));
        }

        if self.control.max_queue_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "control.max_queue_size",
                "0",
                "must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for provider in &self.registry.providers {
            if provider.name.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    "registry.providers[].name",
                    "provider registration",
                ));
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    "registry.providers[].name",
                    provider.name.clone(),
                    "duplicate provider name",
                ));
            }
        }

        Ok(())
    }
}
