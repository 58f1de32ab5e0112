// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Version-stamped lazy expiry queue.
//!
//! A min-heap of `(expires_at, version, key)` tuples. Every update pushes a
//! fresh tuple and leaves the old ones in place — removing an arbitrary heap
//! element is O(n), so stale tuples are kept and filtered out later instead.
//! A tuple is actionable only while its version still matches the live
//! entry's version in the store; anything else was superseded by a newer
//! update and is discarded when popped.
//!
//! ```text
//! increment("a")   → push (t1, v1, "a")
//! increment("a")   → push (t2, v2, "a")      (t1,v1) now stale
//! evict at t1      → pop (t1, v1, "a"), store version is v2 → discard
//! evict at t2      → pop (t2, v2, "a"), store version is v2 → purge
//! ```
//!
//! Cost: amortized O(log n) push + O(log n) pop + O(1) validity check, at
//! the price of stale tuples occupying heap space until drained.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

use parking_lot::Mutex;

/// One deferred-expiry tuple. Compared by deadline, then version.
#[derive(Debug, Clone)]
pub struct ExpiryEntry<K> {
    pub expires_at: Instant,
    pub version: u64,
    pub key: K,
}

impl<K> PartialEq for ExpiryEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.expires_at == other.expires_at && self.version == other.version
    }
}

impl<K> Eq for ExpiryEntry<K> {}

impl<K> PartialOrd for ExpiryEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for ExpiryEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.expires_at
            .cmp(&other.expires_at)
            .then_with(|| self.version.cmp(&other.version))
    }
}

/// Min-heap of expiry tuples, earliest deadline first.
pub struct ExpiryQueue<K> {
    heap: Mutex<BinaryHeap<Reverse<ExpiryEntry<K>>>>,
}

impl<K> ExpiryQueue<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
        }
    }

    /// Push a tuple for `key`. Older tuples for the same key stay in the
    /// heap and are discarded on pop via version mismatch.
    pub fn push(&self, key: K, expires_at: Instant, version: u64) {
        self.heap.lock().push(Reverse(ExpiryEntry {
            expires_at,
            version,
            key,
        }));
    }

    /// Pop the earliest tuple if its deadline is at or before `now`.
    ///
    /// Returns `None` when the heap is empty or the minimum is still in the
    /// future — the signal for an eviction pass to stop.
    pub fn pop_due(&self, now: Instant) -> Option<ExpiryEntry<K>> {
        let mut heap = self.heap.lock();
        let due = matches!(heap.peek(), Some(Reverse(entry)) if entry.expires_at <= now);
        if due {
            heap.pop().map(|Reverse(entry)| entry)
        } else {
            None
        }
    }

    /// Number of pending tuples, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }

    pub fn clear(&self) {
        self.heap.lock().clear();
    }
}

impl<K> Default for ExpiryQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pop_due_earliest_first() {
        let queue = ExpiryQueue::new();
        let now = Instant::now();

        queue.push("late", now + Duration::from_secs(30), 1);
        queue.push("early", now + Duration::from_secs(10), 1);
        queue.push("mid", now + Duration::from_secs(20), 1);

        let at = now + Duration::from_secs(60);
        assert_eq!(queue.pop_due(at).unwrap().key, "early");
        assert_eq!(queue.pop_due(at).unwrap().key, "mid");
        assert_eq!(queue.pop_due(at).unwrap().key, "late");
        assert!(queue.pop_due(at).is_none());
    }

    #[test]
    fn test_pop_due_stops_at_future_minimum() {
        let queue = ExpiryQueue::new();
        let now = Instant::now();

        queue.push("due", now + Duration::from_secs(10), 1);
        queue.push("not-due", now + Duration::from_secs(100), 1);

        let at = now + Duration::from_secs(50);
        assert_eq!(queue.pop_due(at).unwrap().key, "due");
        assert!(queue.pop_due(at).is_none(), "future tuple must stay queued");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_deadline_boundary_is_inclusive() {
        let queue = ExpiryQueue::new();
        let deadline = Instant::now() + Duration::from_secs(10);

        queue.push("k", deadline, 1);
        assert!(queue.pop_due(deadline).is_some());
    }

    #[test]
    fn test_duplicate_tuples_per_key_coexist() {
        let queue = ExpiryQueue::new();
        let now = Instant::now();

        queue.push("k", now + Duration::from_secs(10), 1);
        queue.push("k", now + Duration::from_secs(20), 2);
        queue.push("k", now + Duration::from_secs(30), 3);
        assert_eq!(queue.len(), 3);

        // Oldest generation surfaces first
        let at = now + Duration::from_secs(60);
        assert_eq!(queue.pop_due(at).unwrap().version, 1);
        assert_eq!(queue.pop_due(at).unwrap().version, 2);
        assert_eq!(queue.pop_due(at).unwrap().version, 3);
    }

    #[test]
    fn test_clear() {
        let queue = ExpiryQueue::new();
        queue.push("k", Instant::now(), 1);
        assert!(!queue.is_empty());
        queue.clear();
        assert!(queue.is_empty());
    }
}
