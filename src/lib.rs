//! # Trend Cache
//!
//! A thread-safe, TTL-bounded, score-ordered top-K cache for real-time
//! popularity rankings. Producer threads record weighted events with
//! [`TrendCache::increment`]; reader threads pull a ranked list with
//! [`TrendCache::top_k`] — no per-request database aggregation, no O(n)
//! rescans on the hot path.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TrendCache (orchestrator)               │
//! │  increment / get / top_k / evict_expired / cleanup          │
//! └─────────────────────────────────────────────────────────────┘
//!           │                    │                    │
//!           ▼                    ▼                    ▼
//! ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐
//! │    EntryStore    │ │    ScoreIndex    │ │   ExpiryQueue    │
//! │  DashMap<K,      │ │  SkipMap keyed   │ │  min-heap of     │
//! │   Arc<Entry>>    │ │  by (score, key) │ │  (due, version)  │
//! │                  │ │                  │ │                  │
//! │  source of truth │ │  rank traversal  │ │  lazy eviction   │
//! │  per-key atomic  │ │  tolerates stale │ │  version-checked │
//! │  replace         │ │  entries         │ │  tuples          │
//! └──────────────────┘ └──────────────────┘ └──────────────────┘
//! ```
//!
//! ## Design
//!
//! Every update replaces the whole `CacheEntry {value, score, expires_at,
//! version}` in one per-key atomic step, so `{score, version, expiry}` can
//! never disagree with each other for a live entry. The score index and the
//! expiry heap are allowed to hold stale references; readers and maintenance
//! passes validate each reference against the store (score match for the
//! index, version match for the heap) and skip or purge what no longer
//! applies. This trades a little garbage for never needing cross-structure
//! atomicity or arbitrary-element heap removal.
//!
//! ## Quick Start
//!
//! ```
//! use trend_cache::{TrendCache, TrendCacheConfig};
//!
//! let cache: TrendCache<String, String> = TrendCache::new(TrendCacheConfig::default());
//!
//! // Record popularity events (weights owned by the caller)
//! cache.increment("meme-42".to_string(), 3.0, Some("snapshot".to_string())).unwrap();
//! cache.increment("meme-7".to_string(), 1.0, Some("snapshot".to_string())).unwrap();
//!
//! // Render a trending list
//! let top = cache.top_k(2);
//! assert_eq!(top[0].key, "meme-42");
//!
//! // A caller-owned scheduler reconciles periodically
//! cache.evict_expired();
//! cache.cleanup_stale_index();
//! ```
//!
//! ## Concurrency
//!
//! Updates to the same key are linearized; updates to different keys never
//! block each other. `top_k` is correct (no duplicates, no corrupted rows)
//! but is not a single cross-key snapshot — acceptable for an approximate
//! popularity ranking.
//!
//! ## Modules
//!
//! - [`cache`]: The [`TrendCache`] orchestrator (and a documented naive
//!   contrast case)
//! - [`store`]: Per-key atomic entry store
//! - [`index`]: Concurrent rank-ordered score index
//! - [`expiry`]: Version-stamped lazy expiry queue
//! - [`config`]: Construction-time configuration

pub mod config;
pub mod entry;
pub mod error;
pub mod store;
pub mod index;
pub mod expiry;
pub mod cache;
pub mod metrics;

pub use cache::{LoaderFn, TrendCache, TrendCacheStats};
pub use config::TrendCacheConfig;
pub use entry::CacheEntry;
pub use error::TrendCacheError;
