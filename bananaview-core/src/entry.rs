//! Cache entry and resolution status types.
//!
//! A `CacheEntry` is the internal record kept per item id; a
//! `ResolutionStatus` is the externally visible answer returned for a
//! lookup. The two are deliberately separate: entries carry timestamps
//! and feed the TTL policy, statuses carry only what clients see.

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// CACHE ENTRY
// ============================================================================

/// State of a cached subcategory lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryState {
    /// Upstream answered with a category name and an opaque category id.
    Resolved { name: String, category_id: Value },
    /// A fetch has been queued but has not completed yet.
    Pending,
    /// The last fetch attempt failed (network, timeout, or bad shape).
    Failed,
}

/// One cache record, keyed externally by item id.
///
/// `timestamp` is the unix-second time of creation or last transition.
/// Resolved entries never expire implicitly; Pending/Failed entries are
/// transient and become eligible for a fresh Pending cycle once older
/// than the configured TTL.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub state: EntryState,
    pub timestamp: i64,
}

impl CacheEntry {
    /// Create a Pending entry stamped at `now`.
    pub fn pending(now: i64) -> Self {
        Self {
            state: EntryState::Pending,
            timestamp: now,
        }
    }

    /// Create a Failed entry stamped at `now`.
    pub fn failed(now: i64) -> Self {
        Self {
            state: EntryState::Failed,
            timestamp: now,
        }
    }

    /// Create a Resolved entry stamped at `now`.
    pub fn resolved(name: impl Into<String>, category_id: Value, now: i64) -> Self {
        Self {
            state: EntryState::Resolved {
                name: name.into(),
                category_id,
            },
            timestamp: now,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, EntryState::Resolved { .. })
    }

    /// Whether a transient entry has outlived the TTL.
    ///
    /// Only meaningful for Pending/Failed entries; Resolved entries are
    /// never expired by this check (callers must branch on state first).
    pub fn is_expired(&self, now: i64, ttl_secs: i64) -> bool {
        now - self.timestamp > ttl_secs
    }
}

// ============================================================================
// RESOLUTION STATUS
// ============================================================================

/// Transient status markers as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransientStatus {
    Pending,
    Failed,
}

/// Externally visible outcome for one requested id.
///
/// Serializes to the wire shapes clients consume:
/// `{"category": <name>, "catid": <id>}` for resolved lookups,
/// `{"status": "pending"}` / `{"status": "failed"}` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolutionStatus {
    Resolved { category: String, catid: Value },
    Transient { status: TransientStatus },
}

impl ResolutionStatus {
    pub fn pending() -> Self {
        Self::Transient {
            status: TransientStatus::Pending,
        }
    }

    pub fn failed() -> Self {
        Self::Transient {
            status: TransientStatus::Failed,
        }
    }

    pub fn resolved(category: impl Into<String>, catid: Value) -> Self {
        Self::Resolved {
            category: category.into(),
            catid,
        }
    }

    /// Project a cache entry into its wire status.
    pub fn from_entry(entry: &CacheEntry) -> Self {
        match &entry.state {
            EntryState::Resolved { name, category_id } => {
                Self::resolved(name.clone(), category_id.clone())
            }
            EntryState::Pending => Self::pending(),
            EntryState::Failed => Self::failed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolved_serialization() {
        let status = ResolutionStatus::resolved("WeaponMod", json!(5));
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"category":"WeaponMod","catid":5}"#);
    }

    #[test]
    fn test_pending_serialization() {
        let json = serde_json::to_string(&ResolutionStatus::pending()).unwrap();
        assert_eq!(json, r#"{"status":"pending"}"#);
    }

    #[test]
    fn test_failed_serialization() {
        let json = serde_json::to_string(&ResolutionStatus::failed()).unwrap();
        assert_eq!(json, r#"{"status":"failed"}"#);
    }

    #[test]
    fn test_string_catid_passes_through() {
        let status = ResolutionStatus::resolved("Skins", json!("12345"));
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"category":"Skins","catid":"12345"}"#);
    }

    #[test]
    fn test_expiry_only_past_ttl() {
        let entry = CacheEntry::pending(1_000);
        assert!(!entry.is_expired(1_600, 600));
        assert!(entry.is_expired(1_601, 600));
    }

    #[test]
    fn test_from_entry_matches_state() {
        let now = 42;
        assert_eq!(
            ResolutionStatus::from_entry(&CacheEntry::pending(now)),
            ResolutionStatus::pending()
        );
        assert_eq!(
            ResolutionStatus::from_entry(&CacheEntry::failed(now)),
            ResolutionStatus::failed()
        );
        assert_eq!(
            ResolutionStatus::from_entry(&CacheEntry::resolved("UI", json!(9), now)),
            ResolutionStatus::resolved("UI", json!(9))
        );
    }
}
