//! Pipeline configuration.
//!
//! All tunables for the resolution pipeline live here and are loaded
//! from environment variables with defaults matching the observed
//! deployment. No component reads ambient globals; the config is passed
//! by handle to everything that needs it.

use std::path::PathBuf;
use std::time::Duration;

/// Default upstream detail endpoint (GameBanana Core Item Data API).
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.gamebanana.com/Core/Item/Data";

/// Default per-fetch timeout on the worker path, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 6;

/// Default timeout for inline health-probe fetches, in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Default minimum spacing between upstream requests, in milliseconds.
/// 200ms keeps global upstream QPS at or below 5.
pub const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 200;

/// Default TTL for Pending/Failed entries, in seconds.
pub const DEFAULT_ENTRY_TTL_SECS: i64 = 600;

/// Default reserved health-probe item id.
pub const DEFAULT_PROBE_ID: u64 = 475_764;

/// Default snapshot file path, relative to the working directory.
pub const DEFAULT_CACHE_PATH: &str = "static/subcategory_cache.json";

/// Configuration for the subcategory resolution pipeline.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the upstream item-detail endpoint.
    pub upstream_url: String,

    /// Timeout for worker-path upstream fetches.
    pub fetch_timeout: Duration,

    /// Timeout for inline health-probe fetches (shorter than the worker
    /// path so a hung upstream fails the probe quickly).
    pub probe_timeout: Duration,

    /// Minimum spacing enforced between consecutive upstream requests.
    pub min_request_interval: Duration,

    /// Expiry window after which a non-Resolved entry is re-fetched.
    pub entry_ttl_secs: i64,

    /// Reserved item ids treated as synchronous health probes. These
    /// bypass the cache and the worker queue entirely.
    pub probe_ids: Vec<u64>,

    /// Path of the persisted cache snapshot.
    pub cache_path: PathBuf,

    /// Master switch for category fetching. When disabled, lookups
    /// answer with an empty map and nothing is enqueued.
    pub fetch_enabled: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            min_request_interval: Duration::from_millis(DEFAULT_MIN_REQUEST_INTERVAL_MS),
            entry_ttl_secs: DEFAULT_ENTRY_TTL_SECS,
            probe_ids: vec![DEFAULT_PROBE_ID],
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            fetch_enabled: true,
        }
    }
}

impl CoreConfig {
    /// Create CoreConfig from environment variables.
    ///
    /// Environment variables:
    /// - `BANANAVIEW_UPSTREAM_URL`: upstream detail endpoint
    /// - `BANANAVIEW_FETCH_TIMEOUT_SECS`: worker fetch timeout (default: 6)
    /// - `BANANAVIEW_PROBE_TIMEOUT_SECS`: probe fetch timeout (default: 5)
    /// - `BANANAVIEW_MIN_REQUEST_INTERVAL_MS`: upstream spacing (default: 200)
    /// - `BANANAVIEW_ENTRY_TTL_SECS`: transient-entry TTL (default: 600)
    /// - `BANANAVIEW_PROBE_IDS`: comma-separated reserved probe ids
    ///   (default: 475764)
    /// - `BANANAVIEW_CACHE_PATH`: snapshot file path
    /// - `BANANAVIEW_FETCH_ENABLED`: "true" or "false" (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let upstream_url =
            std::env::var("BANANAVIEW_UPSTREAM_URL").unwrap_or(defaults.upstream_url);

        let fetch_timeout = Duration::from_secs(
            std::env::var("BANANAVIEW_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        );

        let probe_timeout = Duration::from_secs(
            std::env::var("BANANAVIEW_PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
        );

        let min_request_interval = Duration::from_millis(
            std::env::var("BANANAVIEW_MIN_REQUEST_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MIN_REQUEST_INTERVAL_MS),
        );

        let entry_ttl_secs = std::env::var("BANANAVIEW_ENTRY_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_ENTRY_TTL_SECS);

        let probe_ids = std::env::var("BANANAVIEW_PROBE_IDS")
            .ok()
            .map(|s| {
                s.split(',')
                    .filter_map(|token| token.trim().parse().ok())
                    .collect()
            })
            .unwrap_or(defaults.probe_ids);

        let cache_path = std::env::var("BANANAVIEW_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_path);

        let fetch_enabled = std::env::var("BANANAVIEW_FETCH_ENABLED")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            upstream_url,
            fetch_timeout,
            probe_timeout,
            min_request_interval,
            entry_ttl_secs,
            probe_ids,
            cache_path,
            fetch_enabled,
        }
    }

    /// Whether an id is reserved for health probing.
    pub fn is_probe_id(&self, item_id: u64) -> bool {
        self.probe_ids.contains(&item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoreConfig::default();
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.fetch_timeout, Duration::from_secs(6));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.min_request_interval, Duration::from_millis(200));
        assert_eq!(config.entry_ttl_secs, 600);
        assert_eq!(config.probe_ids, vec![475_764]);
        assert!(config.fetch_enabled);
    }

    #[test]
    fn test_probe_id_membership() {
        let config = CoreConfig {
            probe_ids: vec![475_764, 99],
            ..CoreConfig::default()
        };
        assert!(config.is_probe_id(475_764));
        assert!(config.is_probe_id(99));
        assert!(!config.is_probe_id(100));
    }
}
