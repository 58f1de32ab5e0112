// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for trend-cache.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the embedding
//! application chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `trend_cache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: increment, top_k
//! - `pass`: evict, cleanup

use metrics::{counter, histogram};
use std::time::Duration;

/// Record one completed score increment
pub fn record_increment() {
    counter!("trend_cache_increments_total").increment(1);
}

/// Record a loader invocation during a cache-miss increment
pub fn record_loader_call(status: &'static str) {
    counter!("trend_cache_loader_calls_total", "status" => status).increment(1);
}

/// Record entries physically purged by a maintenance pass
pub fn record_purged(pass: &'static str, count: usize) {
    counter!("trend_cache_purged_total", "pass" => pass).increment(count as u64);
}

/// Record ranked-read latency
pub fn record_read_latency(operation: &'static str, duration: Duration) {
    histogram!("trend_cache_read_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}
