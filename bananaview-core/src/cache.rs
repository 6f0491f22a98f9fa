//! In-memory cache store with file snapshotting.
//!
//! The store is a single mutex-guarded map from item id to `CacheEntry`,
//! mirrored to a JSON snapshot file. Every mutation re-serializes the
//! full store to disk synchronously while the lock is held, so the
//! in-memory view and the on-disk snapshot never diverge under
//! concurrent writers. Snapshot writes that fail are logged and the
//! in-memory state stays authoritative.
//!
//! On-disk format, matching the deployed snapshot files:
//! - resolved rows: `{"name": <string>, "id": <json value>}`
//! - transient rows: `{"status": "pending"|"failed", "ts": <unix secs>}`
//!
//! `restore` keeps only resolved rows. Transient rows must never survive
//! a restart, otherwise stale "in-flight" ghosts would block re-fetch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{json, Value};

use crate::entry::{CacheEntry, EntryState};
use crate::error::{PersistError, StoreError};

/// Placeholder name written by a pre-status snapshot format while a
/// fetch was in flight. Rows carrying it are transient and dropped on
/// restore.
const LEGACY_PENDING_PLACEHOLDER: &str = "获取中...";

/// Mutex-guarded subcategory cache mirrored to a snapshot file.
pub struct SubcategoryCache {
    entries: Mutex<HashMap<u64, CacheEntry>>,
    snapshot_path: PathBuf,
}

impl SubcategoryCache {
    /// Create an empty store that snapshots to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            snapshot_path: path.into(),
        }
    }

    /// Load the snapshot at `path`, keeping only resolved rows.
    ///
    /// A missing or unreadable snapshot yields an empty store; the
    /// service must come up either way.
    pub fn restore(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_snapshot(&path) {
            Ok(entries) => {
                tracing::info!(
                    count = entries.len(),
                    path = %path.display(),
                    "Cache snapshot loaded"
                );
                entries
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No cache snapshot found, starting empty");
                HashMap::new()
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to load cache snapshot, starting empty"
                );
                HashMap::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            snapshot_path: path,
        }
    }

    /// Look up the current entry for an item id.
    pub fn get(&self, item_id: u64) -> Result<Option<CacheEntry>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(&item_id).cloned())
    }

    /// Number of entries currently held.
    pub fn len(&self) -> Result<usize, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Render the store into its persisted form.
    pub fn snapshot(&self) -> Result<Value, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(persisted_value(&entries))
    }

    /// Insert or overwrite an entry and snapshot the store.
    ///
    /// Worker-path primitive: a failed snapshot write is returned to the
    /// caller (the in-memory mutation stands regardless) so the worker
    /// can log it and back off.
    pub fn put(&self, item_id: u64, entry: CacheEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(item_id, entry);
        persist(&entries, &self.snapshot_path)?;
        Ok(())
    }

    /// Atomic read-modify-write for one item id.
    ///
    /// The closure sees the current entry and returns an optional
    /// replacement plus an arbitrary verdict; the whole sequence runs
    /// under one lock acquisition so concurrent requests cannot race a
    /// miss check against a Pending write. Request-path primitive: a
    /// failed snapshot write is logged here rather than failing the
    /// lookup that triggered it.
    pub fn update<F, T>(&self, item_id: u64, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(Option<&CacheEntry>) -> (Option<CacheEntry>, T),
    {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        let (replacement, verdict) = f(entries.get(&item_id));
        if let Some(entry) = replacement {
            entries.insert(item_id, entry);
            if let Err(e) = persist(&entries, &self.snapshot_path) {
                tracing::warn!(error = %e, item_id, "Cache snapshot write failed");
            }
        }
        Ok(verdict)
    }
}

/// Serialize the full store into the on-disk snapshot shape.
fn persisted_value(entries: &HashMap<u64, CacheEntry>) -> Value {
    let mut map = serde_json::Map::with_capacity(entries.len());
    for (item_id, entry) in entries {
        let row = match &entry.state {
            EntryState::Resolved { name, category_id } => {
                json!({ "name": name, "id": category_id })
            }
            EntryState::Pending => json!({ "status": "pending", "ts": entry.timestamp }),
            EntryState::Failed => json!({ "status": "failed", "ts": entry.timestamp }),
        };
        map.insert(item_id.to_string(), row);
    }
    Value::Object(map)
}

fn persist(entries: &HashMap<u64, CacheEntry>, path: &Path) -> Result<(), PersistError> {
    let serialized = serde_json::to_string_pretty(&persisted_value(entries))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| PersistError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    std::fs::write(path, serialized).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a snapshot file, applying the compatibility filter: keep only
/// rows with a non-placeholder name and a category id. This drops
/// transient rows and pre-status-format leftovers in one pass.
fn load_snapshot(path: &Path) -> std::io::Result<HashMap<u64, CacheEntry>> {
    let raw = std::fs::read_to_string(path)?;
    let parsed: HashMap<String, Value> = serde_json::from_str(&raw)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let now = Utc::now().timestamp();
    let mut entries = HashMap::new();
    for (key, row) in parsed {
        let Ok(item_id) = key.parse::<u64>() else {
            continue;
        };
        let Some(name) = row.get("name").and_then(Value::as_str) else {
            continue;
        };
        if name.is_empty() || name == LEGACY_PENDING_PLACEHOLDER {
            continue;
        }
        let Some(category_id) = row.get("id").filter(|id| !id.is_null()) else {
            continue;
        };
        entries.insert(
            item_id,
            CacheEntry::resolved(name, category_id.clone(), now),
        );
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, SubcategoryCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = SubcategoryCache::new(dir.path().join("subcategory_cache.json"));
        (dir, cache)
    }

    #[test]
    fn test_put_then_get() {
        let (_dir, cache) = temp_store();
        cache.put(7, CacheEntry::resolved("Skins", json!(3), 100)).unwrap();

        let entry = cache.get(7).unwrap().unwrap();
        assert!(entry.is_resolved());
        assert!(cache.get(8).unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites_pending_with_resolved() {
        let (_dir, cache) = temp_store();
        cache.put(7, CacheEntry::pending(100)).unwrap();
        cache.put(7, CacheEntry::resolved("UI", json!(1), 101)).unwrap();

        let entry = cache.get(7).unwrap().unwrap();
        assert_eq!(entry.state, EntryState::Resolved {
            name: "UI".to_string(),
            category_id: json!(1),
        });
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_only_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subcategory_cache.json");

        let cache = SubcategoryCache::new(&path);
        cache.put(1, CacheEntry::resolved("WeaponMod", json!(5), 100)).unwrap();
        cache.put(2, CacheEntry::pending(100)).unwrap();
        cache.put(3, CacheEntry::failed(100)).unwrap();

        let restored = SubcategoryCache::restore(&path);
        assert_eq!(restored.len().unwrap(), 1);
        let entry = restored.get(1).unwrap().unwrap();
        assert_eq!(entry.state, EntryState::Resolved {
            name: "WeaponMod".to_string(),
            category_id: json!(5),
        });
        assert!(restored.get(2).unwrap().is_none());
        assert!(restored.get(3).unwrap().is_none());
    }

    #[test]
    fn test_restore_applies_compatibility_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subcategory_cache.json");
        let legacy = json!({
            "1": { "name": "获取中..." },
            "2": { "name": "Skins", "id": 42 },
            "3": { "status": "failed", "ts": 1 },
            "4": { "name": "Orphaned" },
            "5": { "name": "", "id": 9 },
            "not-a-number": { "name": "Garbage", "id": 1 }
        });
        std::fs::write(&path, serde_json::to_string(&legacy).unwrap()).unwrap();

        let restored = SubcategoryCache::restore(&path);
        assert_eq!(restored.len().unwrap(), 1);
        assert!(restored.get(2).unwrap().unwrap().is_resolved());
    }

    #[test]
    fn test_restore_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let restored = SubcategoryCache::restore(dir.path().join("absent.json"));
        assert!(restored.is_empty().unwrap());
    }

    #[test]
    fn test_restore_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subcategory_cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let restored = SubcategoryCache::restore(&path);
        assert!(restored.is_empty().unwrap());
    }

    #[test]
    fn test_update_inserts_on_miss() {
        let (_dir, cache) = temp_store();
        let queued = cache
            .update(9, |existing| {
                assert!(existing.is_none());
                (Some(CacheEntry::pending(100)), true)
            })
            .unwrap();

        assert!(queued);
        assert_eq!(cache.get(9).unwrap().unwrap().state, EntryState::Pending);
    }

    #[test]
    fn test_update_can_leave_entry_untouched() {
        let (_dir, cache) = temp_store();
        cache.put(9, CacheEntry::resolved("UI", json!(2), 100)).unwrap();

        let verdict = cache
            .update(9, |existing| {
                assert!(existing.unwrap().is_resolved());
                (None, "kept")
            })
            .unwrap();

        assert_eq!(verdict, "kept");
        assert!(cache.get(9).unwrap().unwrap().is_resolved());
    }

    #[test]
    fn test_snapshot_writes_transient_rows_with_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subcategory_cache.json");
        let cache = SubcategoryCache::new(&path);
        cache.put(2, CacheEntry::pending(123)).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["2"]["status"], "pending");
        assert_eq!(raw["2"]["ts"], 123);

        // The on-disk file is exactly the rendered snapshot.
        assert_eq!(raw, cache.snapshot().unwrap());
    }
}
