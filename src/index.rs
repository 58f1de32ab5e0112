// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Concurrent rank-ordered score index.
//!
//! Maps `(score, key)` composites to nothing but their own ordering: a
//! lock-free skip list whose ascending iteration order *is* the ranking —
//! highest score first, ties broken by ascending key. A score change is
//! always remove-old + insert-new (the sort key itself changes); the two
//! steps are not atomic as a pair, so the index may briefly hold entries
//! whose score no longer matches the store. Readers validate against the
//! store and skip those; [`crate::TrendCache::cleanup_stale_index`] purges
//! them.

use std::cmp::Ordering;

use crossbeam_skiplist::SkipMap;

/// Composite sort key: primary descending score, secondary ascending key.
///
/// `f64::total_cmp` gives a NaN-safe total order, so two distinct keys never
/// compare equal and the ranking is deterministic under score ties.
#[derive(Debug, Clone)]
pub struct ScoredKey<K> {
    pub score: f64,
    pub key: K,
}

impl<K: Ord> PartialEq for ScoredKey<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for ScoredKey<K> {}

impl<K: Ord> PartialOrd for ScoredKey<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for ScoredKey<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed score comparison: ascending skip-list order = rank order
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.key.cmp(&other.key))
    }
}

/// Concurrent ordered index over `(score, key)` pairs.
pub struct ScoreIndex<K>
where
    K: Ord + Send + 'static,
{
    map: SkipMap<ScoredKey<K>, ()>,
}

impl<K> ScoreIndex<K>
where
    K: Ord + Clone + Send + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self { map: SkipMap::new() }
    }

    /// Insert the ranking entry for `(score, key)`. Idempotent.
    pub fn insert(&self, score: f64, key: K) {
        self.map.insert(ScoredKey { score, key }, ());
    }

    /// Remove the ranking entry for exactly `(score, key)`.
    ///
    /// Removing an entry that is not present is a no-op (overlapping updates
    /// race to remove the same stale entry); returns whether anything was
    /// actually removed.
    pub fn remove(&self, score: f64, key: K) -> bool {
        self.map.remove(&ScoredKey { score, key }).is_some()
    }

    /// Traverse in rank order (highest score first, ascending key on ties).
    pub fn iter_ranked(&self) -> impl Iterator<Item = (f64, K)> + '_ {
        self.map
            .iter()
            .map(|entry| (entry.key().score, entry.key().key.clone()))
    }

    /// Number of index entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&self) {
        while self.map.pop_front().is_some() {}
    }
}

impl<K> Default for ScoreIndex<K>
where
    K: Ord + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
