//! Upstream rate limiting.
//!
//! A single global gate spaces out upstream calls: `acquire` returns no
//! sooner than `min_interval` after the previous `acquire` returned,
//! regardless of how many tasks contend for it. The deficit sleep runs
//! while the gate is held; only the single resolution worker and the
//! occasional health probe pass through it, so serializing inside the
//! gate is the contract rather than a bottleneck.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Global minimum-spacing gate for upstream requests.
pub struct UpstreamGate {
    min_interval: Duration,
    last_release: Mutex<Option<Instant>>,
}

impl UpstreamGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_release: Mutex::new(None),
        }
    }

    /// Block until at least `min_interval` has elapsed since the
    /// previous `acquire` returned.
    pub async fn acquire(&self) {
        let mut last_release = self.last_release.lock().await;
        if let Some(previous) = *last_release {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let deficit = self.min_interval - elapsed;
                tracing::debug!(deficit_ms = deficit.as_millis() as u64, "Rate limit wait");
                tokio::time::sleep(deficit).await;
            }
        }
        *last_release = Some(Instant::now());
    }
}
