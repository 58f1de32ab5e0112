//! Cache entry data structure.
//!
//! A [`CacheEntry`] is the single source of truth for one ranked item. It is
//! replaced wholesale on every update — never mutated in place — so its
//! `{score, version, expires_at}` triple is always internally consistent.

use std::time::Instant;

/// One ranked item: value plus ranking metadata.
///
/// The `version` is a per-key generation counter that strictly increases on
/// every update. Auxiliary structures (the score index, the expiry heap)
/// carry copies of `score` or `version` taken at insertion time; a copy is
/// live only while it matches the entry currently in the store.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// Item key
    pub key: K,
    /// Cached payload (e.g., a rendered snapshot of the item)
    pub value: V,
    /// Current popularity score; negative deltas are allowed and never clamped
    pub score: f64,
    /// Absolute expiry deadline, refreshed to `now + ttl` on every update
    pub expires_at: Instant,
    /// Per-key generation counter (first update = 1)
    pub version: u64,
}

impl<K, V> CacheEntry<K, V> {
    /// Whether this entry is logically expired at `now`.
    ///
    /// Expiry is strict: an entry is visible at exactly `expires_at` and
    /// invisible after it.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}
