//! Retry with exponential backoff and jitter.

use crate::error::Classify;
use crate::metrics::MetricsCollector;
use rand::Rng;
use sectorlens_core::RetryPolicy;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Backoff before attempt `attempt` (0-indexed), without jitter:
/// `min(base * multiplier^attempt, max)`.
pub fn raw_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let secs = (policy.base_delay_secs * policy.multiplier.powi(exponent))
        .min(policy.max_delay_secs)
        .max(0.0);
    Duration::from_secs_f64(secs)
}

/// Backoff before attempt `attempt`, scaled into `[0.5, 1.0)` of the raw
/// delay when the policy enables jitter.
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let raw = raw_delay(policy, attempt);
    if policy.jitter {
        let factor: f64 = rand::thread_rng().gen_range(0.5..1.0);
        raw.mul_f64(factor)
    } else {
        raw
    }
}

/// Retry executor for one policy.
#[derive(Debug, Clone, Copy)]
pub struct Retry<'a> {
    policy: &'a RetryPolicy,
    metrics: &'a MetricsCollector,
}

impl<'a> Retry<'a> {
    /// Create an executor; retries are counted on `metrics`.
    pub fn new(policy: &'a RetryPolicy, metrics: &'a MetricsCollector) -> Self {
        Self { policy, metrics }
    }

    /// Run `op` until it succeeds, returns a non-retryable error, or the
    /// attempts are exhausted. The last error is returned.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    let delay = match self.next_delay(attempt, max_attempts, &err) {
                        Some(delay) => delay,
                        None => return Err(err),
                    };
                    drop(err);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Blocking variant of [`Retry::run`].
    pub fn run_blocking<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    let delay = match self.next_delay(attempt, max_attempts, &err) {
                        Some(delay) => delay,
                        None => return Err(err),
                    };
                    std::thread::sleep(delay);
                }
            }
        }
    }

    fn next_delay<E: Classify + fmt::Display>(
        &self,
        attempt: u32,
        max_attempts: u32,
        err: &E,
    ) -> Option<Duration> {
        if !err.is_retryable() {
            tracing::debug!(kind = err.kind(), error = %err, "Not retrying");
            return None;
        }
        if attempt >= max_attempts {
            tracing::warn!(attempts = attempt, error = %err, "All attempts failed");
            return None;
        }

        let delay = delay_for_attempt(self.policy, attempt);
        self.metrics.record_retry();
        tracing::warn!(
            attempt,
            max_attempts,
            ?delay,
            error = %err,
            "Attempt failed, retrying"
        );
        Some(delay)
    }
}
