//! Lazily populated registry of named circuit breakers.

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::metrics::MetricsCollector;
use sectorlens_core::BreakerPolicy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Name of the breaker guarding the generic path.
pub const DEFAULT_BREAKER: &str = "default";

/// Holds the default breaker plus one breaker per named dependency.
#[derive(Debug)]
pub struct BreakerRegistry {
    metrics: Arc<MetricsCollector>,
    default: Arc<CircuitBreaker>,
    named: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    /// Create a registry whose default breaker uses `default_policy`.
    pub fn new(default_policy: BreakerPolicy, metrics: Arc<MetricsCollector>) -> Self {
        let default = Arc::new(CircuitBreaker::new(
            DEFAULT_BREAKER,
            default_policy,
            Arc::clone(&metrics),
        ));
        Self {
            metrics,
            default,
            named: Mutex::new(HashMap::new()),
        }
    }

    /// The default breaker.
    pub fn default_breaker(&self) -> Arc<CircuitBreaker> {
        Arc::clone(&self.default)
    }

    /// Get the breaker called `name`, creating it with `policy` on first use.
    ///
    /// The policy is only consulted when the breaker is created.
    pub fn get_or_create(&self, name: &str, policy: &BreakerPolicy) -> Arc<CircuitBreaker> {
        let mut named = self.named.lock().unwrap_or_else(PoisonError::into_inner);
        let breaker = named.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(breaker = name, "Creating circuit breaker");
            Arc::new(CircuitBreaker::new(
                name,
                policy.clone(),
                Arc::clone(&self.metrics),
            ))
        });
        Arc::clone(breaker)
    }

    /// Breaker dedicated to one target domain.
    pub fn for_domain(&self, domain: &str, policy: &BreakerPolicy) -> Arc<CircuitBreaker> {
        self.get_or_create(&format!("domain:{domain}"), policy)
    }

    /// Every breaker and its current state, default first, then by name.
    pub fn states(&self) -> Vec<(String, CircuitState)> {
        let named = self.named.lock().unwrap_or_else(PoisonError::into_inner);
        let mut states: Vec<(String, CircuitState)> = named
            .values()
            .map(|b| (b.name().to_string(), b.state()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states.insert(0, (self.default.name().to_string(), self.default.state()));
        states
    }
}
