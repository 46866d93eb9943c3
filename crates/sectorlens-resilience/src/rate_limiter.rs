//! Per-host request spacing.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Enforces a minimum delay between requests to the same host.
///
/// The next free slot for a host is reserved under the lock and the caller
/// sleeps after releasing it, so concurrent callers for one host queue up
/// one `min_delay` apart instead of firing together. Hosts whose spacing
/// window has passed are forgotten on the next reservation.
#[derive(Debug, Default)]
pub struct RateLimiter {
    free_at: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `host` may be contacted again.
    pub async fn wait(&self, host: &str, min_delay: Duration) {
        let delay = self.reserve(host, min_delay);
        if !delay.is_zero() {
            tracing::trace!(host, ?delay, "Rate limiting request");
            tokio::time::sleep(delay).await;
        }
    }

    /// Blocking variant of [`RateLimiter::wait`].
    pub fn wait_blocking(&self, host: &str, min_delay: Duration) {
        let delay = self.reserve(host, min_delay);
        if !delay.is_zero() {
            tracing::trace!(host, ?delay, "Rate limiting request");
            std::thread::sleep(delay);
        }
    }

    /// Number of hosts still inside their spacing window as of the last
    /// reservation.
    pub fn tracked_hosts(&self) -> usize {
        self.free_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn reserve(&self, host: &str, min_delay: Duration) -> Duration {
        let mut free_at = self.free_at.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        free_at.retain(|_, until| *until > now);

        let slot = free_at.get(host).copied().unwrap_or(now);
        free_at.insert(host.to_string(), slot + min_delay);
        slot.saturating_duration_since(now)
    }
}
