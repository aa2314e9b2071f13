//! # Structured Logging Module
//!
//! Environment-aware structured logging that writes human-readable output to the
//! console and JSON lines to a per-process log file, so pipeline rounds and
//! breaker transitions can be reconstructed after a debugging session.

use crate::constants::env as env_vars;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call more than once; only the first call installs a subscriber. If a
/// global subscriber already exists (for example one installed by a test
/// harness) the existing one is kept.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let log_dir = get_log_directory();

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(build_filter(&log_level));

        if let Err(e) = fs::create_dir_all(&log_dir) {
            let _ = tracing_subscriber::registry().with(console_layer).try_init();
            tracing::warn!(
                log_dir = %log_dir.display(),
                error = %e,
                "Could not create log directory, logging to console only"
            );
            return None;
        }

        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");
        let log_path = log_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(false)
            .json()
            .with_filter(build_filter(&log_level));

        if tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - keeping it");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "🔧 STRUCTURED LOGGING: Initialized with file output"
        );

        Some(guard)
    });
}

/// `RUST_LOG` wins over the environment-derived default level
fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Get current environment from environment variables
pub(crate) fn get_environment() -> String {
    std::env::var(env_vars::ENVIRONMENT)
        .or_else(|_| std::env::var(env_vars::FALLBACK_ENVIRONMENT))
        .unwrap_or_else(|_| "development".to_string())
        .to_lowercase()
}

fn get_log_directory() -> PathBuf {
    std::env::var(env_vars::LOG_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("log"))
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "test" => "debug".to_string(),
        "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for pipeline control operations
pub fn log_pipeline_operation(
    operation: &str,
    round: u64,
    thought_id: Option<&str>,
    step_point: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        round = round,
        thought_id = thought_id,
        step_point = step_point,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🧠 PIPELINE_OPERATION"
    );
}

/// Log structured data for selection registry operations
pub fn log_registry_operation(
    operation: &str,
    service_type: Option<&str>,
    provider: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        service_type = service_type,
        provider = provider,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📚 REGISTRY_OPERATION"
    );
}

/// Log a circuit breaker state change
pub fn log_breaker_transition(provider: &str, from: &str, to: &str, consecutive_failures: u64) {
    tracing::warn!(
        provider = %provider,
        from = %from,
        to = %to,
        consecutive_failures = consecutive_failures,
        timestamp = %Utc::now().to_rfc3339(),
        "🛡️ BREAKER_TRANSITION"
    );
}

/// Log error with full context
pub fn log_control_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_detection() {
        std::env::set_var(env_vars::ENVIRONMENT, "Test_Override");
        let env = get_environment();
        assert_eq!(env, "test_override");
        std::env::remove_var(env_vars::ENVIRONMENT);
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var(env_vars::LOG_DIR, dir.path());
        init_structured_logging();
        init_structured_logging();
        std::env::remove_var(env_vars::LOG_DIR);
        assert!(LOGGER_INITIALIZED.get().is_some());
    }
}
