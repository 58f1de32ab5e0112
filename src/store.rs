// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-key atomic entry store.
//!
//! The [`EntryStore`] is the authoritative map from item key to
//! [`CacheEntry`]. All mutations go through [`EntryStore::try_compute`],
//! which holds the key's shard entry for the whole read-modify-replace, so
//! concurrent updates to the same key are linearized and no increment is
//! ever lost. Updates to different keys never block each other.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::entry::CacheEntry;

/// Concurrent map from item key to its current entry.
///
/// Entries are stored behind `Arc` so readers clone a pointer, not a payload.
pub struct EntryStore<K, V>
where
    K: Eq + std::hash::Hash,
{
    map: DashMap<K, Arc<CacheEntry<K, V>>>,
}

impl<K, V> EntryStore<K, V>
where
    K: Eq + std::hash::Hash + Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    /// Atomically read the current entry (or none) and replace it with the
    /// closure's result.
    ///
    /// The closure runs while the key's map slot is locked: a concurrent
    /// `try_compute` for the same key waits, one for a different key does
    /// not. If the closure errors, the slot is left untouched.
    ///
    /// Returns `(previous, new)` — the entry that was replaced, if any, and
    /// the entry now installed.
    pub fn try_compute<F, E>(
        &self,
        key: K,
        f: F,
    ) -> Result<(Option<Arc<CacheEntry<K, V>>>, Arc<CacheEntry<K, V>>), E>
    where
        F: FnOnce(Option<&CacheEntry<K, V>>) -> Result<CacheEntry<K, V>, E>,
    {
        match self.map.entry(key) {
            Entry::Occupied(mut occupied) => {
                let previous = Arc::clone(occupied.get());
                let replacement = Arc::new(f(Some(previous.as_ref()))?);
                occupied.insert(Arc::clone(&replacement));
                Ok((Some(previous), replacement))
            }
            Entry::Vacant(vacant) => {
                let created = Arc::new(f(None)?);
                vacant.insert(Arc::clone(&created));
                Ok((None, created))
            }
        }
    }

    /// Current entry for `key`, if any (expired entries included — expiry is
    /// the caller's policy).
    pub fn get(&self, key: &K) -> Option<Arc<CacheEntry<K, V>>> {
        self.map.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Remove `key` only if its current entry still carries `version`.
    ///
    /// This is the eviction guard: a stale expiry tuple whose key was
    /// updated since never matches and removes nothing. Returns the removed
    /// entry on a genuine match.
    pub fn remove_if_version(&self, key: &K, version: u64) -> Option<Arc<CacheEntry<K, V>>> {
        self.map
            .remove_if(key, |_, entry| entry.version == version)
            .map(|(_, entry)| entry)
    }

    /// Number of entries, including not-yet-reconciled expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&self) {
        self.map.clear();
    }
}

impl<K, V> Default for EntryStore<K, V>
where
    K: Eq + std::hash::Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::time::{Duration, Instant};

    fn entry(key: &str, score: f64, version: u64) -> CacheEntry<String, String> {
        CacheEntry {
            key: key.to_string(),
            value: "v".to_string(),
            score,
            expires_at: Instant::now() + Duration::from_secs(60),
            version,
        }
    }

    #[test]
    fn test_compute_inserts_when_absent() {
        let store: EntryStore<String, String> = EntryStore::new();

        let (previous, current) = store
            .try_compute::<_, Infallible>("a".to_string(), |old| {
                assert!(old.is_none());
                Ok(entry("a", 1.0, 1))
            })
            .unwrap();

        assert!(previous.is_none());
        assert_eq!(current.version, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_compute_replaces_and_returns_previous() {
        let store: EntryStore<String, String> = EntryStore::new();
        store
            .try_compute::<_, Infallible>("a".to_string(), |_| Ok(entry("a", 1.0, 1)))
            .unwrap();

        let (previous, current) = store
            .try_compute::<_, Infallible>("a".to_string(), |old| {
                let old = old.unwrap();
                Ok(entry("a", old.score + 2.0, old.version + 1))
            })
            .unwrap();

        assert_eq!(previous.unwrap().version, 1);
        assert_eq!(current.score, 3.0);
        assert_eq!(current.version, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_failed_compute_leaves_slot_untouched() {
        let store: EntryStore<String, String> = EntryStore::new();

        let result = store.try_compute::<_, &str>("a".to_string(), |_| Err("loader down"));
        assert!(result.is_err());
        assert!(store.get(&"a".to_string()).is_none());

        store
            .try_compute::<_, Infallible>("a".to_string(), |_| Ok(entry("a", 1.0, 1)))
            .unwrap();
        let result = store.try_compute::<_, &str>("a".to_string(), |_| Err("loader down"));
        assert!(result.is_err());
        assert_eq!(store.get(&"a".to_string()).unwrap().version, 1);
    }

    #[test]
    fn test_remove_if_version_guards_stale_tuples() {
        let store: EntryStore<String, String> = EntryStore::new();
        store
            .try_compute::<_, Infallible>("a".to_string(), |_| Ok(entry("a", 1.0, 2)))
            .unwrap();

        // Superseded tuple: no-op
        assert!(store.remove_if_version(&"a".to_string(), 1).is_none());
        assert_eq!(store.len(), 1);

        // Genuine match: removed
        let removed = store.remove_if_version(&"a".to_string(), 2).unwrap();
        assert_eq!(removed.score, 1.0);
        assert!(store.is_empty());

        // Absent key: no-op
        assert!(store.remove_if_version(&"a".to_string(), 2).is_none());
    }
}
