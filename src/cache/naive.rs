//! Naive scoreboard — a contrast case, not a recommended API.
//!
//! This is the design [`TrendCache`](crate::TrendCache) exists to avoid: a
//! sorted set of `(score, key)` pairs plus separately locked score and
//! expiry maps. Each structure is individually thread-safe, but an update
//! has to touch all three, and nothing makes the sequence atomic as a pair:
//!
//! 1. Read the old score and write the new one (`scores` lock).
//! 2. Remove the old `(score, key)` pair and insert the new one
//!    (`ranking` lock).
//! 3. Refresh the key's deadline (`expiries` lock).
//!
//! Two concurrent increments on the same key can interleave between steps 1
//! and 2 so that a superseded `(score, key)` pair survives in the ranking —
//! or, depending on the interleaving, so that the live score is missing
//! from it. The TTL map inherits the same gap between steps 1 and 3: a
//! reader can observe the new score with the old deadline.
//!
//! The real cache fixes both by confining `{score, version, expiry}` to one
//! atomically replaced entry per key and letting the auxiliary structures
//! go stale on purpose, reconciled by version/score checks.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::index::ScoredKey;

/// Unsynchronized-as-a-whole scoreboard. See the module docs for why its
/// cross-structure updates are racy.
pub struct NaiveScoreboard<K>
where
    K: Ord + std::hash::Hash + Clone,
{
    scores: Mutex<HashMap<K, f64>>,
    ranking: Mutex<BTreeSet<ScoredKey<K>>>,
    expiries: Mutex<HashMap<K, Instant>>,
    ttl: Duration,
}

impl<K> NaiveScoreboard<K>
where
    K: Ord + std::hash::Hash + Clone,
{
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            scores: Mutex::new(HashMap::new()),
            ranking: Mutex::new(BTreeSet::new()),
            expiries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Add `delta` to `key`'s score.
    ///
    /// Correct in isolation; racy under concurrency because the three steps
    /// release their locks between one another.
    pub fn increment(&self, key: K, delta: f64) {
        let (old, new) = self.apply_score(&key, delta);
        self.reindex(&key, old, new);
        self.expiries.lock().insert(key, Instant::now() + self.ttl);
    }

    /// Current score for `key`, if present and unexpired.
    pub fn get_score(&self, key: &K) -> Option<f64> {
        if self.is_expired(key) {
            return None;
        }
        self.scores.lock().get(key).copied()
    }

    /// Up to `k` unexpired pairs in descending-score order. May contain
    /// superseded scores for a key after racy updates.
    pub fn top_k(&self, k: usize) -> Vec<(K, f64)> {
        let ranking = self.ranking.lock();
        ranking
            .iter()
            .filter(|sk| !self.is_expired(&sk.key))
            .take(k)
            .map(|sk| (sk.key.clone(), sk.score))
            .collect()
    }

    /// Ranking entries currently held, stale ones included.
    #[must_use]
    pub fn ranking_len(&self) -> usize {
        self.ranking.lock().len()
    }

    // Step 1: score mutation under its own lock.
    fn apply_score(&self, key: &K, delta: f64) -> (Option<f64>, f64) {
        let mut scores = self.scores.lock();
        let old = scores.get(key).copied();
        let new = old.unwrap_or(0.0) + delta;
        scores.insert(key.clone(), new);
        (old, new)
    }

    // Step 2: remove-old + insert-new under a different lock. The window
    // between step 1 and this call is the lost-update/stale-score race.
    fn reindex(&self, key: &K, old: Option<f64>, new: f64) {
        let mut ranking = self.ranking.lock();
        if let Some(old) = old {
            ranking.remove(&ScoredKey {
                score: old,
                key: key.clone(),
            });
        }
        ranking.insert(ScoredKey {
            score: new,
            key: key.clone(),
        });
    }

    fn is_expired(&self, key: &K) -> bool {
        match self.expiries.lock().get(key) {
            Some(deadline) => Instant::now() > *deadline,
            None => false,
        }
    }
}
