// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Trend cache orchestrator.
//!
//! [`TrendCache`] ties the three structures together:
//! - [`EntryStore`]: per-key atomic source of truth
//! - [`ScoreIndex`]: rank-ordered traversal, tolerates stale entries
//! - [`ExpiryQueue`]: version-stamped lazy eviction
//!
//! # Per-key lifecycle
//!
//! ```text
//! absent ──increment──▶ live(v=1) ──increment──▶ live(v=2) ── ...
//!                          │
//!                  (deadline passes)
//!                          ▼
//!                  logically expired ──evict_expired──▶ absent
//! ```
//!
//! A key may re-enter `live` any number of times. Expiry is observed lazily:
//! reads simply skip expired entries; physical purging belongs to the two
//! maintenance operations, which a caller-owned scheduler invokes
//! periodically (e.g., `evict_expired` hourly, `cleanup_stale_index` every
//! six hours).

pub mod naive;

use std::cmp::Ordering as CmpOrdering;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::TrendCacheConfig;
use crate::entry::CacheEntry;
use crate::error::TrendCacheError;
use crate::expiry::ExpiryQueue;
use crate::index::ScoreIndex;
use crate::metrics;
use crate::store::EntryStore;

/// Hydrates a value for a key seen for the first time with no explicit value.
///
/// Must not call back into the cache for the same key: it runs inside that
/// key's store slot lock.
pub type LoaderFn<K, V> =
    Box<dyn Fn(&K) -> Result<V, Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;

/// Thread-safe, TTL-bounded, score-ordered top-K cache.
///
/// Construct once at startup and share behind `Arc`; every operation takes
/// `&self` and is safe to call from any thread.
pub struct TrendCache<K, V>
where
    K: Ord + Hash + Clone + Send + 'static,
{
    config: TrendCacheConfig,
    store: EntryStore<K, V>,
    index: ScoreIndex<K>,
    expiry: ExpiryQueue<K>,
    loader: Option<LoaderFn<K, V>>,
    /// Completed increments
    increments: AtomicU64,
    /// Entries purged by `evict_expired`
    evicted: AtomicU64,
    /// Index entries purged by `cleanup_stale_index`
    stale_removed: AtomicU64,
}

/// Point-in-time cache statistics
#[derive(Debug, Clone)]
pub struct TrendCacheStats {
    /// Store entries, not-yet-reconciled expired ones included
    pub entries: usize,
    /// Score index entries, stale ones included
    pub index_entries: usize,
    /// Pending expiry tuples, superseded ones included
    pub pending_expiries: usize,
    /// Completed increments since construction
    pub increments: u64,
    /// Entries purged by `evict_expired`
    pub evicted: u64,
    /// Index entries purged by `cleanup_stale_index`
    pub stale_index_removed: u64,
}

impl<K, V> TrendCache<K, V>
where
    K: Ord + Hash + Clone + Send + 'static,
    V: Clone,
{
    /// Create a cache with no loader: the first increment for a key must
    /// supply a value.
    pub fn new(config: TrendCacheConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a cache that hydrates missing values through `loader`.
    pub fn with_loader(config: TrendCacheConfig, loader: LoaderFn<K, V>) -> Self {
        Self::build(config, Some(loader))
    }

    fn build(config: TrendCacheConfig, loader: Option<LoaderFn<K, V>>) -> Self {
        Self {
            config,
            store: EntryStore::new(),
            index: ScoreIndex::new(),
            expiry: ExpiryQueue::new(),
            loader,
            increments: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            stale_removed: AtomicU64::new(0),
        }
    }

    /// Add `delta` to `key`'s score (negative deltas allowed, never clamped)
    /// and refresh its TTL from now.
    ///
    /// The value installed is, in order of precedence: `value` if supplied,
    /// the prior entry's value, the loader's result. With none of the three
    /// available the increment fails and leaves no trace.
    ///
    /// Concurrent increments for the same key are linearized — each builds
    /// on the previous completed one, so no update is lost. A loader error
    /// propagates to this caller synchronously; there is no internal retry.
    pub fn increment(&self, key: K, delta: f64, value: Option<V>) -> Result<(), TrendCacheError> {
        let expires_at = Instant::now() + self.config.ttl();

        let (previous, current) = self.store.try_compute(key.clone(), |old| {
            let value = match value {
                Some(value) => value,
                None => match old {
                    Some(entry) => entry.value.clone(),
                    None => self.load(&key)?,
                },
            };
            let (score, version) = match old {
                Some(entry) => (entry.score + delta, entry.version + 1),
                None => (delta, 1),
            };
            Ok(CacheEntry {
                key: key.clone(),
                value,
                score,
                expires_at,
                version,
            })
        })?;

        // The sort key changed: retire the old ranking entry before
        // publishing the new one. Equal scores mean an identical composite
        // key, where remove + insert would only churn.
        if let Some(prev) = previous {
            if prev.score.total_cmp(&current.score) != CmpOrdering::Equal {
                self.index.remove(prev.score, key.clone());
            }
        }
        self.index.insert(current.score, key.clone());
        self.expiry.push(key, current.expires_at, current.version);

        self.increments.fetch_add(1, Ordering::Relaxed);
        metrics::record_increment();
        Ok(())
    }

    /// Current entry for `key`, or `None` if absent or expired.
    pub fn get(&self, key: &K) -> Option<CacheEntry<K, V>> {
        let entry = self.store.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(entry.as_ref().clone())
    }

    /// Current score for `key`, or `None` if absent or expired.
    pub fn get_score(&self, key: &K) -> Option<f64> {
        let entry = self.store.get(key)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(entry.score)
    }

    /// The up-to-`k` highest-scored live entries, highest first, score ties
    /// broken by ascending key.
    ///
    /// Pure read: index entries whose backing store entry is missing,
    /// expired, or score-mismatched are skipped, not deleted — purging is
    /// owned by [`Self::evict_expired`] and [`Self::cleanup_stale_index`].
    /// Concurrent updates may or may not be visible; the result is never
    /// duplicated or corrupted, but it is not a cross-key atomic snapshot.
    pub fn top_k(&self, k: usize) -> Vec<CacheEntry<K, V>> {
        let start = Instant::now();
        let mut results = Vec::new();
        if k == 0 {
            return results;
        }

        for (score, key) in self.index.iter_ranked() {
            let Some(entry) = self.store.get(&key) else {
                continue; // purged behind the index's back
            };
            if entry.is_expired(start) {
                continue;
            }
            if entry.score.total_cmp(&score) != CmpOrdering::Equal {
                continue; // stale ranking entry from an older update
            }
            results.push(entry.as_ref().clone());
            if results.len() == k {
                break;
            }
        }

        metrics::record_read_latency("top_k", start.elapsed());
        results
    }

    /// The default-sized trending list (`config.top_k` entries).
    pub fn trending(&self) -> Vec<CacheEntry<K, V>> {
        self.top_k(self.config.top_k)
    }

    /// Physically purge entries whose TTL has elapsed.
    ///
    /// Drains the expiry queue while the earliest deadline is due. A popped
    /// tuple acts only if its version still matches the store entry —
    /// anything else was superseded by a later update and is discarded.
    /// Returns the number of entries actually purged; safe to call on an
    /// empty or already-consistent cache.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;

        while let Some(tuple) = self.expiry.pop_due(now) {
            if let Some(entry) = self.store.remove_if_version(&tuple.key, tuple.version) {
                self.index.remove(entry.score, tuple.key);
                purged += 1;
            }
        }

        if purged > 0 {
            debug!(purged, "evicted expired entries");
        }
        self.evicted.fetch_add(purged as u64, Ordering::Relaxed);
        metrics::record_purged("evict", purged);
        purged
    }

    /// Remove every score-index entry with no live backing store entry.
    ///
    /// A hot key that takes many increments accumulates stale ranking
    /// entries faster than the expiry queue reconciles them; this full scan
    /// is the exhaustive complement to [`Self::evict_expired`]. Returns the
    /// number of index entries removed.
    pub fn cleanup_stale_index(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        let candidates: Vec<(f64, K)> = self.index.iter_ranked().collect();
        for (score, key) in candidates {
            let live = match self.store.get(&key) {
                Some(entry) => {
                    !entry.is_expired(now)
                        && entry.score.total_cmp(&score) == CmpOrdering::Equal
                }
                None => false,
            };
            // A racing update may have already removed this entry; only
            // count removals we actually performed.
            if !live && self.index.remove(score, key) {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "purged stale score-index entries");
        }
        self.stale_removed.fetch_add(removed as u64, Ordering::Relaxed);
        metrics::record_purged("cleanup", removed);
        removed
    }

    /// Store entry count, including not-yet-reconciled expired entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop all state.
    pub fn clear(&self) {
        self.store.clear();
        self.index.clear();
        self.expiry.clear();
        info!("trend cache cleared");
    }

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> TrendCacheStats {
        TrendCacheStats {
            entries: self.store.len(),
            index_entries: self.index.len(),
            pending_expiries: self.expiry.len(),
            increments: self.increments.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            stale_index_removed: self.stale_removed.load(Ordering::Relaxed),
        }
    }

    fn load(&self, key: &K) -> Result<V, TrendCacheError> {
        let Some(loader) = &self.loader else {
            return Err(TrendCacheError::NoValue);
        };
        match loader(key) {
            Ok(value) => {
                metrics::record_loader_call("success");
                Ok(value)
            }
            Err(source) => {
                metrics::record_loader_call("error");
                Err(TrendCacheError::Loader(source))
            }
        }
    }
}
