//! Concurrency tests for the trend cache.
//!
//! Exercises the linearization guarantee (no lost updates per key) and
//! mixed reader/writer/maintenance workloads from plain OS threads — the
//! cache is synchronous and must hold up without any cooperative scheduling.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use trend_cache::{TrendCache, TrendCacheConfig};

fn shared_cache() -> Arc<TrendCache<String, String>> {
    Arc::new(TrendCache::new(TrendCacheConfig::default()))
}

#[test]
fn test_no_lost_updates_single_key() {
    let cache = shared_cache();
    let mut handles = Vec::new();

    // 10 threads x 100 increments of +1.0 on the same key
    for _ in 0..10 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                cache
                    .increment("meme1".to_string(), 1.0, Some("snap".to_string()))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.get_score(&"meme1".to_string()), Some(1000.0));
    assert_eq!(cache.get(&"meme1".to_string()).unwrap().version, 1000);
    assert_eq!(cache.stats().increments, 1000);
}

#[test]
fn test_concurrent_updates_across_distinct_keys() {
    let cache = shared_cache();
    let mut handles = Vec::new();

    // Each thread owns one key; key i ends at score (i+1) * 50
    for i in 0..8u32 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            let key = format!("meme{i}");
            for _ in 0..50 {
                cache
                    .increment(key.clone(), (i + 1) as f64, Some("snap".to_string()))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 8);
    let top = cache.top_k(3);
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].key, "meme7");
    assert_eq!(top[0].score, 400.0);
    assert_eq!(top[1].key, "meme6");
    assert_eq!(top[2].key, "meme5");
}

#[test]
fn test_readers_never_observe_duplicates_or_garbage() {
    let cache = shared_cache();
    let mut handles = Vec::new();

    // Writers hammer a small key space so index churn is constant
    for t in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..500 {
                let key = format!("meme{}", (t + i) % 5);
                cache
                    .increment(key, 1.0, Some("snap".to_string()))
                    .unwrap();
            }
        }));
    }

    // Readers validate every snapshot they take
    for _ in 0..3 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for _ in 0..300 {
                let top = cache.top_k(5);
                assert!(top.len() <= 5);

                // No duplicate keys in a single read
                let mut keys: Vec<_> = top.iter().map(|e| e.key.clone()).collect();
                keys.sort();
                keys.dedup();
                assert_eq!(keys.len(), top.len(), "duplicate key in top_k result");

                // Descending scores, deterministic tie-break
                for pair in top.windows(2) {
                    assert!(
                        pair[0].score > pair[1].score
                            || (pair[0].score == pair[1].score && pair[0].key < pair[1].key),
                        "ranking out of order: {:?} before {:?}",
                        (&pair[0].key, pair[0].score),
                        (&pair[1].key, pair[1].score),
                    );
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // 4 writers x 500 increments spread over 5 keys
    let total: f64 = (0..5)
        .map(|i| cache.get_score(&format!("meme{i}")).unwrap())
        .sum();
    assert_eq!(total, 2000.0);
}

#[test]
fn test_maintenance_runs_safely_alongside_writers() {
    let cache: Arc<TrendCache<String, String>> = Arc::new(TrendCache::new(TrendCacheConfig {
        ttl_ms: 50,
        top_k: 6,
    }));
    let mut handles = Vec::new();

    for t in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                let key = format!("meme{}", (t * 200 + i) % 10);
                cache
                    .increment(key, 1.0, Some("snap".to_string()))
                    .unwrap();
                if i % 50 == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
            }
        }));
    }

    // Maintenance interleaves with the writers
    {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for _ in 0..20 {
                cache.evict_expired();
                cache.cleanup_stale_index();
                thread::sleep(Duration::from_millis(2));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Let everything expire, then a full drain leaves no state behind
    thread::sleep(Duration::from_millis(100));
    cache.evict_expired();
    cache.cleanup_stale_index();

    assert!(cache.is_empty());
    assert_eq!(cache.stats().index_entries, 0);
    assert!(cache.top_k(10).is_empty());
}

#[test]
fn test_loader_runs_once_per_fresh_key_under_contention() {
    use std::sync::atomic::{AtomicU64, Ordering};

    let loads = Arc::new(AtomicU64::new(0));
    let loads_in_loader = Arc::clone(&loads);

    let cache: Arc<TrendCache<String, String>> = Arc::new(TrendCache::with_loader(
        TrendCacheConfig::default(),
        Box::new(move |key| {
            loads_in_loader.fetch_add(1, Ordering::Relaxed);
            Ok(format!("loaded-{key}"))
        }),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for _ in 0..25 {
                cache.increment("meme1".to_string(), 1.0, None).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // Only the very first increment finds no prior value; every later one
    // carries the prior entry's value forward under the same key lock.
    assert_eq!(loads.load(Ordering::Relaxed), 1);
    assert_eq!(cache.get_score(&"meme1".to_string()), Some(200.0));
    assert_eq!(
        cache.get(&"meme1".to_string()).unwrap().value,
        "loaded-meme1"
    );
}
