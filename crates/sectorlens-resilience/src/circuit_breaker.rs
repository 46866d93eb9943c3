//! Circuit breaker state machine.
//!
//! - **Closed**: calls pass through. Failures increment a counter, successes
//!   decrement it. Reaching `failure_threshold` opens the circuit.
//! - **Open**: calls are rejected without touching the network until
//!   `recovery_timeout` has elapsed since opening.
//! - **HalfOpen**: trial calls pass through. `success_threshold` successes
//!   close the circuit; any failure reopens it.
//!
//! The Open to HalfOpen transition happens lazily inside
//! [`CircuitBreaker::can_execute`]; there is no background timer.

use crate::metrics::MetricsCollector;
use sectorlens_core::BreakerPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Rejecting calls
    Open,
    /// Allowing trial calls
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
}

/// A named circuit breaker guarding one logical dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    policy: BreakerPolicy,
    metrics: Arc<MetricsCollector>,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(
        name: impl Into<String>,
        policy: BreakerPolicy,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            name: name.into(),
            policy,
            metrics,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
            }),
        }
    }

    /// Breaker name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Policy this breaker was created with.
    pub fn policy(&self) -> &BreakerPolicy {
        &self.policy
    }

    /// Current state, without triggering the recovery transition.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Current failure counter.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Whether a call may proceed. Moves Open to HalfOpen once the
    /// recovery timeout has elapsed.
    pub fn can_execute(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let recovered = inner
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.policy.recovery_timeout());
                if recovered {
                    inner.state = CircuitState::HalfOpen;
                    inner.success_count = 0;
                    tracing::info!(breaker = %self.name, "Circuit breaker half-open");
                }
                recovered
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = inner.failure_count.saturating_sub(1);
            }
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.policy.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.opened_at = None;
                    tracing::info!(breaker = %self.name, "Circuit breaker closed");
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self) {
        let tripped = {
            let mut inner = self.lock();
            inner.failure_count = inner.failure_count.saturating_add(1);
            match inner.state {
                CircuitState::Closed if inner.failure_count >= self.policy.failure_threshold => {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    true
                }
                CircuitState::HalfOpen => {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    inner.success_count = 0;
                    tracing::warn!(
                        breaker = %self.name,
                        "Trial call failed, circuit breaker reopened"
                    );
                    false
                }
                _ => false,
            }
        };

        if tripped {
            tracing::warn!(
                breaker = %self.name,
                threshold = self.policy.failure_threshold,
                "Circuit breaker opened"
            );
            self.metrics.record_circuit_trip();
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
