//! Breaker + retry + metrics composition.

use crate::breakers::BreakerRegistry;
use crate::circuit_breaker::CircuitBreaker;
use crate::error::{CallError, Classify};
use crate::metrics::MetricsCollector;
use crate::rate_limiter::RateLimiter;
use crate::retry::Retry;
use sectorlens_core::{BreakerPolicy, RetryPolicy};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// The shared resilience substrate: metrics, breakers and rate limiter.
///
/// Construct one per process and hand it to every component as `Arc<Resilience>`.
#[derive(Debug)]
pub struct Resilience {
    metrics: Arc<MetricsCollector>,
    breakers: BreakerRegistry,
    rate_limiter: RateLimiter,
}

impl Resilience {
    /// Create a substrate with a fresh metrics collector.
    pub fn new(default_breaker: BreakerPolicy) -> Self {
        Self::with_metrics(default_breaker, Arc::new(MetricsCollector::new()))
    }

    /// Create a substrate reporting to an existing collector.
    pub fn with_metrics(default_breaker: BreakerPolicy, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            breakers: BreakerRegistry::new(default_breaker, Arc::clone(&metrics)),
            metrics,
            rate_limiter: RateLimiter::new(),
        }
    }

    /// Shared metrics collector.
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Breaker registry.
    pub fn breakers(&self) -> &BreakerRegistry {
        &self.breakers
    }

    /// Per-host rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Run `op` behind `breaker` with retries per `policy`, recording one
    /// request sample against `target`.
    pub async fn call<T, E, F, Fut>(
        &self,
        breaker: &CircuitBreaker,
        policy: &RetryPolicy,
        target: &str,
        op: F,
    ) -> Result<T, CallError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        if !breaker.can_execute() {
            return Err(self.reject(breaker, target));
        }

        let started = Instant::now();
        let result = Retry::new(policy, &self.metrics).run(op).await;
        self.settle(breaker, target, started, result)
    }

    /// Blocking variant of [`Resilience::call`].
    pub fn call_blocking<T, E, F>(
        &self,
        breaker: &CircuitBreaker,
        policy: &RetryPolicy,
        target: &str,
        op: F,
    ) -> Result<T, CallError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        if !breaker.can_execute() {
            return Err(self.reject(breaker, target));
        }

        let started = Instant::now();
        let result = Retry::new(policy, &self.metrics).run_blocking(op);
        self.settle(breaker, target, started, result)
    }

    fn reject<E>(&self, breaker: &CircuitBreaker, target: &str) -> CallError<E> {
        tracing::debug!(breaker = breaker.name(), target, "Circuit open, call rejected");
        self.metrics.record_error("CircuitOpenError");
        CallError::CircuitOpen {
            name: breaker.name().to_string(),
        }
    }

    fn settle<T, E: Classify>(
        &self,
        breaker: &CircuitBreaker,
        target: &str,
        started: Instant,
        result: Result<T, E>,
    ) -> Result<T, CallError<E>> {
        let elapsed = started.elapsed();
        match result {
            Ok(value) => {
                breaker.record_success();
                self.metrics.record_success(target, elapsed);
                Ok(value)
            }
            Err(err) => {
                breaker.record_failure();
                self.metrics.record_failure(target, elapsed, err.kind());
                Err(CallError::Failed(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitState;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Unreachable;

    impl fmt::Display for Unreachable {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "unreachable")
        }
    }

    impl Classify for Unreachable {
        fn kind(&self) -> &'static str {
            "TransientNetworkError"
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(2, 0.001, 0.005, 2.0)
    }

    #[tokio::test]
    async fn test_success_records_sample() {
        let resilience = Resilience::new(BreakerPolicy::default());
        let breaker = resilience.breakers().default_breaker();

        let value: Result<u32, CallError<Unreachable>> = resilience
            .call(&breaker, &fast_policy(), "acme.com", || async { Ok(7) })
            .await;

        assert_eq!(value.expect("call succeeds"), 7);
        let snapshot = resilience.metrics().snapshot();
        assert_eq!(snapshot.requests_success, 1);
        assert_eq!(snapshot.unique_domains, 1);
    }

    #[tokio::test]
    async fn test_failure_records_kind_and_feeds_breaker() {
        let resilience = Resilience::new(BreakerPolicy::default());
        let breaker = resilience
            .breakers()
            .get_or_create("flaky", &BreakerPolicy::new(1, 60.0, 1));

        let result: Result<(), CallError<Unreachable>> = resilience
            .call(&breaker, &fast_policy(), "acme.com", || async { Err(Unreachable) })
            .await;

        assert!(matches!(result, Err(CallError::Failed(Unreachable))));
        assert_eq!(breaker.state(), CircuitState::Open);
        let snapshot = resilience.metrics().snapshot();
        assert_eq!(snapshot.requests_failed, 1);
        assert_eq!(snapshot.requests_retried, 1);
        assert_eq!(snapshot.errors_by_type.get("TransientNetworkError"), Some(&1));
    }

    #[tokio::test]
    async fn test_open_circuit_short_circuits() {
        let resilience = Resilience::new(BreakerPolicy::default());
        let breaker = resilience
            .breakers()
            .get_or_create("down", &BreakerPolicy::new(1, 60.0, 1));
        breaker.record_failure();

        let calls = Cell::new(0);
        let result: Result<(), CallError<Unreachable>> = resilience
            .call(&breaker, &fast_policy(), "acme.com", || {
                calls.set(calls.get() + 1);
                async { Ok(()) }
            })
            .await;

        assert!(result.expect_err("circuit is open").is_circuit_open());
        assert_eq!(calls.get(), 0);
        assert_eq!(resilience.metrics().snapshot().requests_total, 0);
    }

    #[test]
    fn test_blocking_call() {
        let resilience = Resilience::new(BreakerPolicy::default());
        let breaker = resilience.breakers().default_breaker();
        let mut calls = 0;

        let result: Result<&str, CallError<Unreachable>> =
            resilience.call_blocking(&breaker, &fast_policy(), "acme.com", || {
                calls += 1;
                if calls == 1 {
                    Err(Unreachable)
                } else {
                    Ok("ok")
                }
            });

        assert_eq!(result.expect("second attempt succeeds"), "ok");
        assert_eq!(resilience.metrics().snapshot().requests_success, 1);
    }
}
