//! # System Constants
//!
//! Defaults and fixed labels shared by the pipeline controller, the selection
//! registry and the control façade.

/// Circuit breaker defaults used when no configuration overrides them
pub mod circuit_breaker {
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
    pub const DEFAULT_RESET_TIMEOUT_SECONDS: f64 = 30.0;
}

/// Pipeline controller defaults
pub mod pipeline {
    /// Completed thought durations kept for the rolling average
    pub const DEFAULT_MAX_THOUGHT_HISTORY: usize = 100;
    /// Times a thought may be sent back to action selection after a conscience failure
    pub const DEFAULT_MAX_CONSCIENCE_RETRIES: u32 = 2;
}

/// Control façade defaults
pub mod control {
    pub const DEFAULT_PROCESSOR_NAME: &str = "agent";
    pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;
    /// Reported seconds-per-thought before any thought has completed
    pub const DEFAULT_SECONDS_PER_THOUGHT: f64 = 10.0;
    /// Free text crossing the operator boundary is cut to this many characters
    pub const MAX_BOUNDARY_TEXT_LEN: usize = 4096;
}

/// Processor status labels reported by pause/resume
pub mod status {
    pub const RUNNING: &str = "running";
    pub const PAUSED: &str = "paused";
}

/// Environment variables consulted by configuration and logging
pub mod env {
    pub const ENVIRONMENT: &str = "RUNTIME_CONTROL_ENV";
    pub const FALLBACK_ENVIRONMENT: &str = "APP_ENV";
    pub const CONFIG_DIR: &str = "RUNTIME_CONTROL_CONFIG_DIR";
    pub const LOG_DIR: &str = "RUNTIME_CONTROL_LOG_DIR";
}
