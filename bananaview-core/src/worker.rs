//! Resolution worker.
//!
//! A single long-lived task drains the resolution queue: dequeue an item
//! id, pass the rate-limit gate, fetch, write the classified outcome
//! back into the cache. The queue closing (all senders dropped) is the
//! only shutdown signal; in normal operation the worker lives as long as
//! the process. An error escaping one iteration is logged and followed
//! by a short pause; the loop always resumes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cache::SubcategoryCache;
use crate::entry::CacheEntry;
use crate::error::StoreError;
use crate::fetcher::{FetchOutcome, SubcategoryFetcher};
use crate::rate_limit::UpstreamGate;

/// Pause after a failed iteration before resuming the drain loop.
const FAILURE_PAUSE: Duration = Duration::from_secs(1);

/// Single-consumer drain loop over the resolution queue.
pub struct ResolutionWorker {
    queue: UnboundedReceiver<u64>,
    cache: Arc<SubcategoryCache>,
    gate: Arc<UpstreamGate>,
    fetcher: Arc<dyn SubcategoryFetcher>,
    fetch_timeout: Duration,
}

impl ResolutionWorker {
    pub fn new(
        queue: UnboundedReceiver<u64>,
        cache: Arc<SubcategoryCache>,
        gate: Arc<UpstreamGate>,
        fetcher: Arc<dyn SubcategoryFetcher>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            cache,
            gate,
            fetcher,
            fetch_timeout,
        }
    }

    /// Run until the queue closes.
    pub async fn run(mut self) {
        tracing::info!("Resolution worker started");

        while let Some(item_id) = self.queue.recv().await {
            if let Err(e) = self.process(item_id).await {
                tracing::error!(item_id, error = %e, "Resolution iteration failed");
                tokio::time::sleep(FAILURE_PAUSE).await;
            }
        }

        tracing::info!("Resolution queue closed, worker stopping");
    }

    /// One iteration: gate, fetch, write back.
    ///
    /// The id may already be Resolved by the time it is dequeued
    /// (duplicates are permitted in the queue); the overwrite is
    /// idempotent and harmless.
    async fn process(&self, item_id: u64) -> Result<(), StoreError> {
        tracing::debug!(item_id, "Processing resolution request");

        self.gate.acquire().await;
        let outcome = self.fetcher.fetch(item_id, self.fetch_timeout).await;

        let now = Utc::now().timestamp();
        let entry = match outcome {
            FetchOutcome::Resolved { name, category_id } => {
                CacheEntry::resolved(name, category_id, now)
            }
            FetchOutcome::Failed => CacheEntry::failed(now),
        };
        self.cache.put(item_id, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryState;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    struct ScriptedFetcher {
        outcome: FetchOutcome,
    }

    #[async_trait]
    impl SubcategoryFetcher for ScriptedFetcher {
        async fn fetch(&self, _item_id: u64, _timeout: Duration) -> FetchOutcome {
            self.outcome.clone()
        }
    }

    fn build_worker(
        outcome: FetchOutcome,
    ) -> (
        mpsc::UnboundedSender<u64>,
        Arc<SubcategoryCache>,
        ResolutionWorker,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(SubcategoryCache::new(dir.path().join("cache.json")));
        let gate = Arc::new(UpstreamGate::new(Duration::from_millis(1)));
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = ResolutionWorker::new(
            rx,
            Arc::clone(&cache),
            gate,
            Arc::new(ScriptedFetcher { outcome }),
            Duration::from_secs(6),
        );
        (tx, cache, worker, dir)
    }

    #[tokio::test]
    async fn test_worker_writes_resolved_outcome() {
        let outcome = FetchOutcome::Resolved {
            name: "WeaponMod".to_string(),
            category_id: json!(5),
        };
        let (tx, cache, worker, _dir) = build_worker(outcome);

        tx.send(100).unwrap();
        drop(tx);
        worker.run().await;

        let entry = cache.get(100).unwrap().unwrap();
        assert_eq!(
            entry.state,
            EntryState::Resolved {
                name: "WeaponMod".to_string(),
                category_id: Value::from(5),
            }
        );
    }

    #[tokio::test]
    async fn test_worker_writes_failed_outcome() {
        let (tx, cache, worker, _dir) = build_worker(FetchOutcome::Failed);

        tx.send(100).unwrap();
        drop(tx);
        worker.run().await;

        assert_eq!(cache.get(100).unwrap().unwrap().state, EntryState::Failed);
    }

    #[tokio::test]
    async fn test_worker_tolerates_already_resolved_entries() {
        let outcome = FetchOutcome::Resolved {
            name: "Fresh".to_string(),
            category_id: json!(2),
        };
        let (tx, cache, worker, _dir) = build_worker(outcome);
        cache
            .put(100, CacheEntry::resolved("Stale", json!(1), 10))
            .unwrap();

        tx.send(100).unwrap();
        drop(tx);
        worker.run().await;

        let entry = cache.get(100).unwrap().unwrap();
        assert_eq!(
            entry.state,
            EntryState::Resolved {
                name: "Fresh".to_string(),
                category_id: Value::from(2),
            }
        );
    }

    #[tokio::test]
    async fn test_worker_stops_when_queue_closes() {
        let (tx, _cache, worker, _dir) = build_worker(FetchOutcome::Failed);
        drop(tx);
        // Returns promptly instead of blocking forever.
        worker.run().await;
    }
}
