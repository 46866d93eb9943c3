//! Threshold checks over a metrics snapshot.

use crate::metrics::MetricsSnapshot;
use sectorlens_core::AlertThresholds;
use serde::Serialize;
use std::fmt;

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Too many calls failed
    HighErrorRate,
    /// Calls are slow on average
    SlowResponses,
    /// Breakers keep opening
    CircuitTrips,
    /// The cache is not absorbing lookups
    LowCacheHitRate,
}

/// A threshold violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Alert category
    pub kind: AlertKind,
    /// Observed value
    pub value: f64,
    /// Configured threshold
    pub threshold: f64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AlertKind::HighErrorRate => write!(
                f,
                "failure rate {:.1}% exceeds {:.1}%",
                self.value, self.threshold
            ),
            AlertKind::SlowResponses => write!(
                f,
                "average response time {:.2}s exceeds {:.2}s",
                self.value, self.threshold
            ),
            AlertKind::CircuitTrips => write!(
                f,
                "{} circuit breaker trips exceed {}",
                self.value, self.threshold
            ),
            AlertKind::LowCacheHitRate => write!(
                f,
                "cache hit rate {:.1}% is below {:.1}%",
                self.value, self.threshold
            ),
        }
    }
}

/// Compare a snapshot against thresholds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if snapshot.requests_total > 0 && snapshot.failure_rate > thresholds.error_rate_percent {
        alerts.push(Alert {
            kind: AlertKind::HighErrorRate,
            value: snapshot.failure_rate,
            threshold: thresholds.error_rate_percent,
        });
    }

    if snapshot.average_response_time > thresholds.response_time_secs {
        alerts.push(Alert {
            kind: AlertKind::SlowResponses,
            value: snapshot.average_response_time,
            threshold: thresholds.response_time_secs,
        });
    }

    if snapshot.circuit_breaker_trips > thresholds.circuit_breaker_trips {
        alerts.push(Alert {
            kind: AlertKind::CircuitTrips,
            value: snapshot.circuit_breaker_trips as f64,
            threshold: thresholds.circuit_breaker_trips as f64,
        });
    }

    let lookups = snapshot.cache_hits + snapshot.cache_misses;
    if lookups > 0 && snapshot.cache_hit_rate < thresholds.cache_hit_rate_percent {
        alerts.push(Alert {
            kind: AlertKind::LowCacheHitRate,
            value: snapshot.cache_hit_rate,
            threshold: thresholds.cache_hit_rate_percent,
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCollector;
    use std::time::Duration;

    #[test]
    fn test_quiet_run_has_no_alerts() {
        let metrics = MetricsCollector::new();
        metrics.record_success("a.com", Duration::from_millis(5));
        metrics.record_cache_hit();
        assert!(evaluate(&metrics.snapshot(), &AlertThresholds::default()).is_empty());
    }

    #[test]
    fn test_empty_run_has_no_alerts() {
        let metrics = MetricsCollector::new();
        assert!(evaluate(&metrics.snapshot(), &AlertThresholds::default()).is_empty());
    }

    #[test]
    fn test_thresholds_trigger() {
        let metrics = MetricsCollector::new();
        metrics.record_failure("a.com", Duration::from_millis(5), "TransientNetworkError");
        metrics.record_success("b.com", Duration::from_millis(5));
        for _ in 0..4 {
            metrics.record_circuit_trip();
        }
        metrics.record_cache_miss();

        let alerts = evaluate(&metrics.snapshot(), &AlertThresholds::default());
        let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AlertKind::HighErrorRate,
                AlertKind::CircuitTrips,
                AlertKind::LowCacheHitRate
            ]
        );
        assert_eq!(alerts[0].to_string(), "failure rate 50.0% exceeds 10.0%");
    }
}
