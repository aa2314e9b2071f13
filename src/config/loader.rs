//! Configuration Loader
//!
//! Environment-aware configuration loading: file discovery, environment
//! detection and deep-merging of environment override blocks.

use super::error::{ConfigResult, ConfigurationError};
use super::RuntimeControlConfig;
use crate::constants::env as env_vars;
use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_FILE_NAMES: [&str; 2] = ["runtime-control.yaml", "runtime-control.yml"];
const ENVIRONMENT_SECTIONS: [&str; 3] = ["development", "test", "production"];

/// Loaded, validated configuration together with where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: RuntimeControlConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Tests use this to avoid touching process-wide environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config_file = Self::find_config_file(&config_directory)?;
        Self::build(&config_file, config_directory, environment)
    }

    /// Load a specific configuration file with explicit environment
    pub fn load_from_file(path: &Path, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::build(path, config_directory, environment)
    }

    fn build(
        config_file: &Path,
        config_directory: PathBuf,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config = Self::load_and_merge_config(config_file, environment)?;
        config.validate()?;

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&Self::sanitize_config_for_logging(&config))
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );

        info!(
            environment = %environment,
            config_file = %config_file.display(),
            providers = config.registry.providers.len(),
            failure_threshold = config.circuit_breakers.default_config.failure_threshold,
            "⚙️ Runtime control configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration (validated first)
    pub fn from_config(config: RuntimeControlConfig, environment: &str) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &RuntimeControlConfig {
        &self.config
    }

    /// Configuration as JSON with sensitive-looking fields masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the configuration directory
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect current environment from environment variables
    pub fn detect_environment() -> String {
        crate::logging::get_environment()
    }

    fn default_config_directory() -> PathBuf {
        env::var(env_vars::CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    /// Find the configuration file
    fn find_config_file(config_directory: &Path) -> ConfigResult<PathBuf> {
        let mut searched_paths = Vec::new();

        for name in CONFIG_FILE_NAMES {
            let config_path = config_directory.join(name);
            searched_paths.push(config_path.clone());

            if config_path.exists() {
                debug!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        Err(ConfigurationError::config_file_not_found(searched_paths))
    }

    /// Read a configuration file with a size limit
    fn read_config_file_safely(path: &Path) -> ConfigResult<String> {
        const MAX_CONFIG_FILE_SIZE: u64 = 10 * 1024 * 1024;

        let metadata = std::fs::metadata(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))?;

        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigurationError::invalid_value(
                "file_size",
                metadata.len().to_string(),
                format!(
                    "Configuration file too large ({}MB > {}MB limit)",
                    metadata.len() / (1024 * 1024),
                    MAX_CONFIG_FILE_SIZE / (1024 * 1024)
                ),
            ));
        }

        if !metadata.is_file() {
            return Err(ConfigurationError::invalid_value(
                "file_type",
                "directory or special file",
                "Configuration path must point to a regular file",
            ));
        }

        std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))
    }

    /// Parse the file and merge the active environment's override block over the base
    fn load_and_merge_config(
        config_file: &Path,
        environment: &str,
    ) -> ConfigResult<RuntimeControlConfig> {
        let yaml_content = Self::read_config_file_safely(config_file)?;

        let mut yaml_data: YamlValue = serde_yaml::from_str(&yaml_content)
            .map_err(|e| ConfigurationError::invalid_yaml(config_file.display().to_string(), e))?;

        if yaml_data.is_null() {
            yaml_data = YamlValue::Mapping(Default::default());
        }

        if let Some(env_overrides) = yaml_data
            .get(YamlValue::String(environment.to_string()))
            .cloned()
        {
            debug!(
                "Applying environment-specific overrides for: {}",
                environment
            );
            Self::merge_yaml_values(&mut yaml_data, env_overrides);
        }

        if let YamlValue::Mapping(ref mut map) = yaml_data {
            for section in ENVIRONMENT_SECTIONS {
                map.remove(YamlValue::String(section.to_string()));
            }
        }

        serde_yaml::from_value(yaml_data).map_err(|e| {
            ConfigurationError::invalid_yaml(
                config_file.display().to_string(),
                format!("Failed to deserialize configuration: {e}"),
            )
        })
    }

    /// Recursively merge YAML values (environment overrides into base config)
    fn merge_yaml_values(base: &mut YamlValue, override_value: YamlValue) {
        match (&mut *base, override_value) {
            (YamlValue::Mapping(base_map), YamlValue::Mapping(override_map)) => {
                for (key, value) in override_map {
                    if let Some(existing_value) = base_map.get_mut(&key) {
                        Self::merge_yaml_values(existing_value, value);
                    } else {
                        base_map.insert(key, value);
                    }
                }
            }
            (base_ref, override_val) => {
                *base_ref = override_val;
            }
        }
    }

    /// Mask fields whose names suggest credentials (provider metadata may carry API keys)
    fn sanitize_config_for_logging(config: &RuntimeControlConfig) -> serde_json::Value {
        let mut config_json = serde_json::to_value(config).unwrap_or(serde_json::Value::Null);
        let sensitive_patterns = ["password", "secret", "key", "token", "credential", "auth"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        *val = match val {
                            serde_json::Value::String(s) if s.is_empty() => {
                                serde_json::Value::String("[EMPTY]".to_string())
                            }
                            _ => serde_json::Value::String("[MASKED]".to_string()),
                        };
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}
