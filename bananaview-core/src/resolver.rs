//! Request coordinator.
//!
//! The resolver answers batch lookups by consulting the cache and
//! applying the TTL policy, per id:
//!
//! 1. Missing from cache: write Pending(now), enqueue, report Pending.
//! 2. Resolved: pass through, no enqueue. Resolved entries are permanent
//!    until a fresh pending cycle overwrites them.
//! 3. Pending/Failed and fresh: report the current status, no enqueue —
//!    this is the coalescing contract keeping at most one in-flight
//!    fetch per item.
//! 4. Pending/Failed and past the TTL: overwrite with a fresh
//!    Pending(now), enqueue, report Pending. Expiry is always an
//!    overwrite, never a delete, so concurrent readers never observe a
//!    known id vanish into "never seen".
//!
//! Each decision runs as one atomic cache update. Reserved probe ids
//! skip the cache and the worker queue: the upstream is called inline
//! with the shorter probe timeout and the result is never cached. Probe
//! fetches still pass the upstream gate, which is global across the
//! worker and every inline probe.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;

use crate::cache::SubcategoryCache;
use crate::config::CoreConfig;
use crate::entry::{CacheEntry, EntryState, ResolutionStatus};
use crate::fetcher::{FetchOutcome, SubcategoryFetcher};
use crate::rate_limit::UpstreamGate;

/// Coordinator for inbound batch lookups.
pub struct Resolver {
    cache: Arc<SubcategoryCache>,
    queue: UnboundedSender<u64>,
    gate: Arc<UpstreamGate>,
    fetcher: Arc<dyn SubcategoryFetcher>,
    config: CoreConfig,
}

impl Resolver {
    pub fn new(
        cache: Arc<SubcategoryCache>,
        queue: UnboundedSender<u64>,
        gate: Arc<UpstreamGate>,
        fetcher: Arc<dyn SubcategoryFetcher>,
        config: CoreConfig,
    ) -> Self {
        Self {
            cache,
            queue,
            gate,
            fetcher,
            config,
        }
    }

    /// Resolve a batch of item ids into wire statuses.
    ///
    /// Never blocks on the worker: misses are enqueued and answered
    /// Pending immediately, so resolution is eventually consistent and
    /// clients poll. An empty input yields an empty map. When category
    /// fetching is disabled the whole lookup answers with an empty map.
    pub async fn resolve(&self, ids: &[u64]) -> HashMap<u64, ResolutionStatus> {
        let mut result = HashMap::with_capacity(ids.len());
        if !self.config.fetch_enabled {
            return result;
        }

        for &item_id in ids {
            let status = if self.config.is_probe_id(item_id) {
                self.probe(item_id).await
            } else {
                self.lookup(item_id)
            };
            result.insert(item_id, status);
        }
        result
    }

    /// Synchronous inline health probe.
    ///
    /// Bypasses the cache and the worker so liveness checks neither
    /// pollute shared state nor consume TTL slots. The upstream gate is
    /// not bypassed: probes count against the same global spacing as
    /// worker fetches.
    pub async fn probe(&self, item_id: u64) -> ResolutionStatus {
        self.gate.acquire().await;
        match self.fetcher.fetch(item_id, self.config.probe_timeout).await {
            FetchOutcome::Resolved { name, category_id } => {
                ResolutionStatus::resolved(name, category_id)
            }
            FetchOutcome::Failed => ResolutionStatus::failed(),
        }
    }

    /// Apply the four-way cache/TTL policy to one id.
    fn lookup(&self, item_id: u64) -> ResolutionStatus {
        let now = Utc::now().timestamp();
        let ttl_secs = self.config.entry_ttl_secs;

        let verdict = self.cache.update(item_id, |existing| match existing {
            None => (
                Some(CacheEntry::pending(now)),
                (ResolutionStatus::pending(), true),
            ),
            Some(entry) => match entry.state {
                EntryState::Resolved { .. } => {
                    (None, (ResolutionStatus::from_entry(entry), false))
                }
                EntryState::Pending | EntryState::Failed => {
                    if entry.is_expired(now, ttl_secs) {
                        (
                            Some(CacheEntry::pending(now)),
                            (ResolutionStatus::pending(), true),
                        )
                    } else {
                        (None, (ResolutionStatus::from_entry(entry), false))
                    }
                }
            },
        });

        match verdict {
            Ok((status, enqueue)) => {
                if enqueue {
                    if self.queue.send(item_id).is_err() {
                        // Receiver gone: the entry stays Pending until the
                        // TTL forces a retry after the worker is back.
                        tracing::warn!(item_id, "Resolution queue closed, enqueue dropped");
                    }
                }
                status
            }
            Err(e) => {
                tracing::error!(item_id, error = %e, "Cache access failed");
                ResolutionStatus::failed()
            }
        }
    }
}
