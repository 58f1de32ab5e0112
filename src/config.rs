//! Configuration for the trend cache.
//!
//! # Example
//!
//! ```
//! use trend_cache::TrendCacheConfig;
//!
//! // Minimal config (uses defaults)
//! let config = TrendCacheConfig::default();
//! assert_eq!(config.ttl_ms, 7 * 24 * 60 * 60 * 1000); // 7 days
//! assert_eq!(config.top_k, 6);
//!
//! // Full config
//! let config = TrendCacheConfig {
//!     ttl_ms: 60 * 60 * 1000, // 1 hour
//!     top_k: 10,
//! };
//! ```

use serde::Deserialize;
use std::time::Duration;

/// Configuration for the trend cache.
///
/// All fields have sensible defaults tuned for a "trending this week" list.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendCacheConfig {
    /// Entry time-to-live in milliseconds, refreshed on every update
    /// (default: 7 days)
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Default ranked-list size returned by `trending()` (default: 6)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_ttl_ms() -> u64 { 7 * 24 * 60 * 60 * 1000 } // 7 days
fn default_top_k() -> usize { 6 }

impl TrendCacheConfig {
    /// TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for TrendCacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            top_k: default_top_k(),
        }
    }
}
