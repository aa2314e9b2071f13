//! # Resilience Module
//!
//! Per-provider circuit breakers used by the service selection registry.
//!
//! ## Usage
//!
//! ```rust
//! use runtime_control::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(
//!     "openai_primary",
//!     CircuitBreakerConfig::new(2, Duration::from_secs(30)),
//! );
//!
//! breaker.report_failure();
//! breaker.report_failure();
//! assert_eq!(breaker.state(), CircuitState::Open);
//! assert!(!breaker.is_available());
//!
//! breaker.reset();
//! assert!(breaker.is_available());
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerStatus;
