//! Per-host fetch pacing
//!
//! Each host has a "next free" instant. Reserving a slot returns the earliest allowed
//! start and pushes the host's next free instant forward by the host's delay, so two
//! fetch starts on one host are never closer than that delay, even when reserved
//! from concurrent tasks.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct Pacer {
    next_free: Mutex<HashMap<String, Instant>>,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next start slot on `host` and returns when it opens
    pub fn reserve(&self, host: &str, delay: Duration) -> Instant {
        let now = Instant::now();
        let mut next_free = match self.next_free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let start = next_free
            .get(host)
            .map_or(now, |&free| free.max(now));
        let following = start
            .checked_add(delay)
            .unwrap_or_else(|| far_future(start));
        next_free.insert(host.to_string(), following);

        tracing::trace!("Slot on {} opens in {:?}", host, start - now);
        start
    }

    /// Waits for the next start slot on `host`
    pub async fn wait_turn(&self, host: &str, delay: Duration) {
        let start = self.reserve(host, delay);
        tokio::time::sleep_until(start).await;
    }
}

/// Latest instant reachable from `start`, stepping down until the addition fits
fn far_future(start: Instant) -> Instant {
    let mut step = Duration::from_secs(u64::from(u32::MAX));
    while step > Duration::ZERO {
        if let Some(later) = start.checked_add(step) {
            return later;
        }
        step /= 2;
    }
    start
}
