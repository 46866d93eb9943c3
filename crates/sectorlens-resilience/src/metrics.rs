//! Request, retry, breaker and cache counters.

use crate::error::MetricsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Counters {
    requests_total: u64,
    requests_success: u64,
    requests_failed: u64,
    requests_retried: u64,
    circuit_breaker_trips: u64,
    cache_hits: u64,
    cache_misses: u64,
    response_time_total: Duration,
    errors_by_type: BTreeMap<String, u64>,
    targets: HashSet<String>,
}

/// Thread-safe metrics collector shared by every resilient call.
#[derive(Debug)]
pub struct MetricsCollector {
    started: Instant,
    started_at: DateTime<Utc>,
    counters: Mutex<Counters>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Start a new collection window.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Record a successful call against `target`.
    pub fn record_success(&self, target: &str, elapsed: Duration) {
        let mut c = self.lock();
        c.requests_total += 1;
        c.requests_success += 1;
        c.response_time_total += elapsed;
        c.targets.insert(target.to_string());
    }

    /// Record a failed call against `target`.
    pub fn record_failure(&self, target: &str, elapsed: Duration, kind: &str) {
        let mut c = self.lock();
        c.requests_total += 1;
        c.requests_failed += 1;
        c.response_time_total += elapsed;
        c.targets.insert(target.to_string());
        *c.errors_by_type.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Count an error that did not correspond to an attempted request.
    pub fn record_error(&self, kind: &str) {
        *self.lock().errors_by_type.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Count a retry.
    pub fn record_retry(&self) {
        self.lock().requests_retried += 1;
    }

    /// Count a breaker opening.
    pub fn record_circuit_trip(&self) {
        self.lock().circuit_breaker_trips += 1;
    }

    /// Count a cache hit.
    pub fn record_cache_hit(&self) {
        self.lock().cache_hits += 1;
    }

    /// Count a cache miss.
    pub fn record_cache_miss(&self) {
        self.lock().cache_misses += 1;
    }

    /// Compute a point-in-time summary.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = self.lock();
        let runtime = self.started.elapsed().as_secs_f64();
        let total = c.requests_total as f64;
        let cache_lookups = c.cache_hits + c.cache_misses;

        let percent = |part: u64, whole: f64| {
            if whole > 0.0 {
                part as f64 / whole * 100.0
            } else {
                0.0
            }
        };

        MetricsSnapshot {
            started_at: self.started_at,
            runtime_seconds: runtime,
            requests_total: c.requests_total,
            requests_success: c.requests_success,
            requests_failed: c.requests_failed,
            requests_retried: c.requests_retried,
            success_rate: percent(c.requests_success, total),
            failure_rate: percent(c.requests_failed, total),
            retry_rate: percent(c.requests_retried, total),
            average_response_time: if c.requests_total > 0 {
                c.response_time_total.as_secs_f64() / total
            } else {
                0.0
            },
            circuit_breaker_trips: c.circuit_breaker_trips,
            unique_domains: c.targets.len(),
            cache_hits: c.cache_hits,
            cache_misses: c.cache_misses,
            cache_hit_rate: percent(c.cache_hits, cache_lookups as f64),
            errors_by_type: c.errors_by_type.clone(),
            requests_per_second: if runtime > 0.0 { total / runtime } else { 0.0 },
        }
    }

    /// Write the current snapshot as pretty JSON.
    pub fn export_json(&self, path: &Path) -> Result<(), MetricsError> {
        let snapshot = self.snapshot();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        tracing::info!(path = %path.display(), "Exported metrics snapshot");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Summary of everything recorded so far. Rates are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// When collection started
    pub started_at: DateTime<Utc>,
    /// Seconds since collection started
    pub runtime_seconds: f64,
    /// Calls completed (success or final failure)
    pub requests_total: u64,
    /// Successful calls
    pub requests_success: u64,
    /// Calls that failed after all retries
    pub requests_failed: u64,
    /// Retries performed
    pub requests_retried: u64,
    /// Percentage of calls that succeeded
    pub success_rate: f64,
    /// Percentage of calls that failed
    pub failure_rate: f64,
    /// Retries per hundred calls
    pub retry_rate: f64,
    /// Mean call duration in seconds
    pub average_response_time: f64,
    /// Closed-to-open breaker transitions
    pub circuit_breaker_trips: u64,
    /// Distinct call targets
    pub unique_domains: usize,
    /// Cache hits
    pub cache_hits: u64,
    /// Cache misses
    pub cache_misses: u64,
    /// Percentage of cache lookups that hit
    pub cache_hit_rate: f64,
    /// Error counts keyed by kind
    pub errors_by_type: BTreeMap<String, u64>,
    /// Throughput over the whole window
    pub requests_per_second: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_snapshot() {
        let metrics = MetricsCollector::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 0);
        assert!(snapshot.success_rate.abs() < f64::EPSILON);
        assert!(snapshot.cache_hit_rate.abs() < f64::EPSILON);
        assert!(snapshot.average_response_time.abs() < f64::EPSILON);
    }

    #[test]
    fn test_rates_and_targets() {
        let metrics = MetricsCollector::new();
        metrics.record_success("a.com", Duration::from_millis(100));
        metrics.record_success("a.com", Duration::from_millis(300));
        metrics.record_success("b.com", Duration::from_millis(200));
        metrics.record_failure("c.com", Duration::from_millis(400), "TransientNetworkError");
        metrics.record_retry();
        metrics.record_retry();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 4);
        assert_eq!(snapshot.requests_success, 3);
        assert_eq!(snapshot.requests_failed, 1);
        assert!((snapshot.success_rate - 75.0).abs() < 1e-9);
        assert!((snapshot.failure_rate - 25.0).abs() < 1e-9);
        assert!((snapshot.retry_rate - 50.0).abs() < 1e-9);
        assert!((snapshot.average_response_time - 0.25).abs() < 1e-9);
        assert_eq!(snapshot.unique_domains, 3);
        assert_eq!(snapshot.errors_by_type.get("TransientNetworkError"), Some(&1));
    }

    #[test]
    fn test_cache_hit_rate() {
        let metrics = MetricsCollector::new();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 3);
        assert!((snapshot.cache_hit_rate - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_error_without_request() {
        let metrics = MetricsCollector::new();
        metrics.record_error("CircuitOpenError");
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 0);
        assert_eq!(snapshot.errors_by_type.get("CircuitOpenError"), Some(&1));
    }

    #[test]
    fn test_export_json() {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("reports").join("metrics.json");

        let metrics = MetricsCollector::new();
        metrics.record_success("a.com", Duration::from_millis(10));
        metrics.record_circuit_trip();
        metrics.export_json(&path).expect("export metrics");

        let contents = fs::read_to_string(&path).expect("read export");
        let parsed: MetricsSnapshot = serde_json::from_str(&contents).expect("parse export");
        assert_eq!(parsed.requests_total, 1);
        assert_eq!(parsed.circuit_breaker_trips, 1);
        assert!(contents.contains("\"cache_hit_rate\""));
    }
}
