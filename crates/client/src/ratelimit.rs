//! Per-domain minimum-interval rate limiting.
//!
//! A politeness gate, not a hard contract: state is process-local, reset on
//! restart, and not coordinated across instances.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Per-domain minimum-spacing gate.
///
/// Callers for the same domain are dispatched at least `delay` apart, in
/// arrival order. The next dispatch slot is reserved under the lock and the
/// wait happens outside it, so one slow domain never stalls the others.
pub struct RateLimiter {
    delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay, next_slot: Mutex::new(HashMap::new()) }
    }

    /// Suspend until a request to `domain` is permitted.
    ///
    /// Records the dispatch time for the domain whether or not a wait
    /// occurred.
    pub async fn wait_for_domain(&self, domain: &str) {
        if self.delay.is_zero() {
            return;
        }

        let dispatch_at = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let at = slots
                .get(domain)
                .map(|last| *last + self.delay)
                .filter(|at| *at > now)
                .unwrap_or(now);
            slots.insert(domain.to_string(), at);
            at
        };

        let now = Instant::now();
        if dispatch_at > now {
            tracing::debug!(domain, wait_ms = (dispatch_at - now).as_millis() as u64, "rate limiting");
            tokio::time::sleep_until(dispatch_at).await;
        }
    }

    /// Number of domains currently tracked.
    pub async fn tracked_domains(&self) -> usize {
        self.next_slot.lock().await.len()
    }
}
