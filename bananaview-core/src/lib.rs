//! BananaView core - subcategory resolution pipeline.
//!
//! This crate implements the fetch-and-cache engine behind the
//! BananaView proxy: a mutex-guarded cache store mirrored to a JSON
//! snapshot, a global upstream rate-limit gate, a classified upstream
//! fetcher, a single-consumer resolution worker, and the request
//! coordinator that applies the cache/TTL policy. The HTTP surface
//! lives in `bananaview-api`.

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod fetcher;
pub mod rate_limit;
pub mod resolver;
pub mod worker;

use std::sync::Arc;

use tokio::sync::mpsc;

// Re-export commonly used types
pub use cache::SubcategoryCache;
pub use config::CoreConfig;
pub use entry::{CacheEntry, EntryState, ResolutionStatus, TransientStatus};
pub use error::{PersistError, StoreError, UpstreamError};
pub use fetcher::{FetchOutcome, HttpFetcher, SubcategoryFetcher};
pub use rate_limit::UpstreamGate;
pub use resolver::Resolver;
pub use worker::ResolutionWorker;

/// Wire the full resolution pipeline.
///
/// Restores the cache snapshot from `config.cache_path`, builds the
/// rate-limit gate and the work queue, and returns the coordinator
/// together with the worker. The caller spawns the worker
/// (`tokio::spawn(worker.run())`); dropping every `Resolver` handle
/// closes the queue and stops it.
pub fn build_pipeline(
    config: CoreConfig,
    fetcher: Arc<dyn SubcategoryFetcher>,
) -> (Arc<Resolver>, ResolutionWorker) {
    let cache = Arc::new(SubcategoryCache::restore(&config.cache_path));
    let gate = Arc::new(UpstreamGate::new(config.min_request_interval));
    let (queue_tx, queue_rx) = mpsc::unbounded_channel();

    let worker = ResolutionWorker::new(
        queue_rx,
        Arc::clone(&cache),
        Arc::clone(&gate),
        Arc::clone(&fetcher),
        config.fetch_timeout,
    );
    let resolver = Arc::new(Resolver::new(cache, queue_tx, gate, fetcher, config));

    (resolver, worker)
}
