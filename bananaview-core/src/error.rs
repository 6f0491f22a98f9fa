//! Error types for the resolution pipeline.
//!
//! Nothing in this crate propagates an error far enough to crash the
//! process: upstream failures collapse to a `Failed` cache entry,
//! persistence failures are logged and the in-memory store stays
//! authoritative. These types exist so the collapse points can log
//! something precise.

use std::path::PathBuf;
use thiserror::Error;

/// Upstream lookup errors. Both variants classify as `Failed` at the
/// fetcher boundary; the distinction is only surfaced in logs.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected upstream response shape: {reason}")]
    Format { reason: String },
}

/// Cache snapshot persistence errors. Non-fatal by contract: a failed
/// snapshot write never rolls back the in-memory mutation.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize cache snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write cache snapshot to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Cache store access errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Persist(#[from] PersistError),
}
