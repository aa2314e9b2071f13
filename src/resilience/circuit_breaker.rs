//! # Circuit Breaker Implementation
//!
//! Per-provider failure tracker with three states: Closed (normal operation),
//! Open (provider skipped by selection) and Half-Open (eligible again until
//! the next reported outcome decides). Half-Open does not limit how many
//! callers select the provider before that outcome arrives.
//!
//! Outcome reporting is the hot path: every outbound provider call reports
//! here. Counters are plain atomics and the Closed-state fast paths never take
//! a lock. State transitions take a per-breaker mutex so that `state` and
//! `opened_at` always change together; nothing is shared between breakers.
//!
//! There is no background timer. Open → Half-Open is decided lazily from the
//! `opened_at` timestamp whenever [`CircuitBreaker::is_available`] is asked.

use crate::logging::log_breaker_transition;
use crate::resilience::{CircuitBreakerConfig, CircuitBreakerStatus};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};

/// Lock-free outcome counters
#[derive(Debug)]
struct AtomicBreakerCounters {
    total_calls: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    consecutive_failures: AtomicU64,
    last_success_epoch_nanos: AtomicU64,
    last_failure_epoch_nanos: AtomicU64,
}

impl AtomicBreakerCounters {
    fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            last_success_epoch_nanos: AtomicU64::new(0),
            last_failure_epoch_nanos: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_success(&self, now_nanos: u64) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.last_success_epoch_nanos
            .store(now_nanos, Ordering::Relaxed);
    }

    #[inline]
    fn record_failure(&self, now_nanos: u64) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.last_failure_epoch_nanos
            .store(now_nanos, Ordering::Relaxed);
    }

    #[inline]
    fn increment_consecutive_failures(&self) -> u64 {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    fn reset_consecutive_failures(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    fn clear(&self) {
        self.total_calls.store(0, Ordering::Relaxed);
        self.success_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }
}

/// Get current epoch nanos from SystemTime
#[inline]
fn epoch_nanos_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos() as u64
}

/// Zero means "never"
pub(crate) fn epoch_nanos_to_datetime(nanos: u64) -> Option<DateTime<Utc>> {
    if nanos == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp((nanos / 1_000_000_000) as i64, (nanos % 1_000_000_000) as u32)
}

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - provider is selectable
    Closed = 0,
    /// Failing - provider is skipped until the reset timeout elapses
    Open = 1,
    /// Recovering - provider is selectable; the next outcome decides
    HalfOpen = 2,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

/// Circuit breaker guarding one provider
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Provider name for logging and status
    name: String,

    /// Current circuit state
    state: AtomicU8,

    config: CircuitBreakerConfig,

    counters: AtomicBreakerCounters,

    /// Epoch nanos when the circuit was opened (0 = not open).
    /// Written before `state` on open, cleared after `state` on close.
    opened_at_epoch_nanos: AtomicU64,

    /// Serializes state transitions for this breaker only
    transition_lock: Mutex<()>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        debug!(
            provider = %name,
            failure_threshold = config.failure_threshold,
            reset_timeout_seconds = config.reset_timeout_seconds,
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            counters: AtomicBreakerCounters::new(),
            opened_at_epoch_nanos: AtomicU64::new(0),
            transition_lock: Mutex::new(()),
        }
    }

    /// Current stored state. Does not perform the lazy Open → Half-Open check.
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.counters.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        epoch_nanos_to_datetime(self.opened_at_epoch_nanos.load(Ordering::Acquire))
    }

    /// True iff the provider may be selected (Closed or Half-Open).
    ///
    /// An Open breaker whose reset timeout has elapsed moves to Half-Open here.
    pub fn is_available(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => self.try_half_open(),
        }
    }

    fn reset_timeout_elapsed(&self, opened_nanos: u64) -> bool {
        let elapsed_nanos = epoch_nanos_now().saturating_sub(opened_nanos);
        elapsed_nanos >= self.config.reset_timeout().as_nanos() as u64
    }

    fn try_half_open(&self) -> bool {
        let opened_nanos = self.opened_at_epoch_nanos.load(Ordering::Acquire);
        if opened_nanos != 0 && !self.reset_timeout_elapsed(opened_nanos) {
            return false;
        }

        let _guard = self.transition_lock.lock();
        match self.state() {
            CircuitState::Open => {
                let opened_nanos = self.opened_at_epoch_nanos.load(Ordering::Acquire);
                if opened_nanos == 0 {
                    error!(provider = %self.name, "Circuit open with no opened_at timestamp");
                    return false;
                }
                if !self.reset_timeout_elapsed(opened_nanos) {
                    return false;
                }
                self.transition_to_half_open();
                true
            }
            // Another observer already moved it on
            CircuitState::Closed | CircuitState::HalfOpen => true,
        }
    }

    /// Record a successful call
    pub fn report_success(&self) {
        self.counters.record_success(epoch_nanos_now());

        match self.state() {
            CircuitState::Closed => {
                self.counters.reset_consecutive_failures();
            }
            CircuitState::HalfOpen => {
                let _guard = self.transition_lock.lock();
                match self.state() {
                    CircuitState::HalfOpen => self.transition_to_closed(CircuitState::HalfOpen),
                    CircuitState::Closed => self.counters.reset_consecutive_failures(),
                    CircuitState::Open => {}
                }
            }
            CircuitState::Open => {
                // A call that started before the circuit opened
                debug!(provider = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a failed call
    pub fn report_failure(&self) {
        self.counters.record_failure(epoch_nanos_now());

        match self.state() {
            CircuitState::Closed => {
                let failures = self.counters.increment_consecutive_failures();
                debug!(
                    provider = %self.name,
                    consecutive_failures = failures,
                    failure_threshold = self.config.failure_threshold,
                    "Provider call failed"
                );
                if failures >= self.config.failure_threshold as u64 {
                    let _guard = self.transition_lock.lock();
                    if self.state() == CircuitState::Closed {
                        self.transition_to_open(CircuitState::Closed);
                    }
                }
            }
            CircuitState::HalfOpen => {
                let _guard = self.transition_lock.lock();
                if self.state() == CircuitState::HalfOpen {
                    self.transition_to_open(CircuitState::HalfOpen);
                }
            }
            CircuitState::Open => {
                // Already open, just counted
            }
        }
    }

    /// Force Closed and clear counters regardless of prior state
    pub fn reset(&self) {
        let _guard = self.transition_lock.lock();
        let previous = self.state();
        self.counters.clear();
        self.transition_to_closed(previous);
        info!(provider = %self.name, previous_state = %previous, "Circuit breaker reset");
    }

    /// Force Open (operator action or tests)
    pub fn force_open(&self) {
        let _guard = self.transition_lock.lock();
        warn!(provider = %self.name, "Circuit breaker forced open");
        let previous = self.state();
        self.transition_to_open(previous);
    }

    /// Caller must hold `transition_lock`
    fn transition_to_closed(&self, from: CircuitState) {
        self.counters.reset_consecutive_failures();
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);
        self.opened_at_epoch_nanos.store(0, Ordering::Release);

        if from != CircuitState::Closed {
            info!(provider = %self.name, from = %from, "Circuit breaker closed (recovered)");
            log_breaker_transition(&self.name, from.as_str(), "closed", 0);
        }
    }

    /// Caller must hold `transition_lock`
    fn transition_to_open(&self, from: CircuitState) {
        self.opened_at_epoch_nanos
            .store(epoch_nanos_now(), Ordering::Release);
        self.state.store(CircuitState::Open as u8, Ordering::Release);

        let consecutive_failures = self.consecutive_failures();
        error!(
            provider = %self.name,
            from = %from,
            consecutive_failures = consecutive_failures,
            failure_threshold = self.config.failure_threshold,
            reset_timeout_seconds = self.config.reset_timeout_seconds,
            "Circuit breaker opened"
        );
        log_breaker_transition(&self.name, from.as_str(), "open", consecutive_failures);
    }

    /// Caller must hold `transition_lock`
    fn transition_to_half_open(&self) {
        self.state
            .store(CircuitState::HalfOpen as u8, Ordering::Release);

        info!(provider = %self.name, "Circuit breaker half-open (provider eligible again)");
        log_breaker_transition(&self.name, "open", "half_open", self.consecutive_failures());
    }

    /// Point-in-time status snapshot
    pub fn status(&self) -> CircuitBreakerStatus {
        CircuitBreakerStatus {
            service_name: self.name.clone(),
            state: self.state(),
            consecutive_failures: self.consecutive_failures(),
            failure_count: self.counters.failure_count.load(Ordering::Relaxed),
            success_count: self.counters.success_count.load(Ordering::Relaxed),
            total_calls: self.counters.total_calls.load(Ordering::Relaxed),
            failure_threshold: self.config.failure_threshold,
            reset_timeout_seconds: self.config.reset_timeout_seconds,
            opened_at: self.opened_at(),
            last_failure_time: epoch_nanos_to_datetime(
                self.counters
                    .last_failure_epoch_nanos
                    .load(Ordering::Relaxed),
            ),
            last_success_time: epoch_nanos_to_datetime(
                self.counters
                    .last_success_epoch_nanos
                    .load(Ordering::Relaxed),
            ),
        }
    }
}
