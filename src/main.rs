//! Polycache demo
//!
//! Walks the three cache modes with log output: recency eviction, recency
//! with expiry, and pure expiry with refresh-on-read.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use polycache::{Cache, CacheConfig, ChangeCallbacks};

fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polycache=info,polycache_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base = CacheConfig::from_env();
    info!(
        "configuration loaded: ttl={:?}, max_entries={}",
        base.ttl, base.max_entries
    );

    lru_demo();
    lru_with_ttl_demo();
    ttl_demo();
}

/// Fills a bounded recency cache past capacity and shows which keys survive.
fn lru_demo() {
    info!("--- LRU mode ---");

    let adds = Arc::new(AtomicUsize::new(0));
    let removes = Arc::new(AtomicUsize::new(0));
    let add_count = adds.clone();
    let remove_count = removes.clone();

    let config = CacheConfig::new().max_entries(5).callbacks(
        ChangeCallbacks::new()
            .on_add(move || {
                add_count.fetch_add(1, Ordering::Relaxed);
            })
            .on_remove(move || {
                remove_count.fetch_add(1, Ordering::Relaxed);
            }),
    );
    let cache: Cache<u32, String> = Cache::lru(config);

    for n in 1..=5 {
        cache.add(n, format!("payload {}", n));
    }

    // Touching key 1 protects it from the overflow eviction below
    if cache.get(&1).is_some() {
        info!("key 1 read, now most recently used");
    }
    cache.add(6, "payload 6".to_string());

    info!(
        "size after overflow: {} (adds seen by hook: {})",
        cache.size(),
        adds.load(Ordering::Relaxed)
    );
    match cache.get(&2) {
        Some(_) => info!("key 2 unexpectedly survived"),
        None => info!("key 2 was evicted as least recently used"),
    }

    cache.remove(&1);
    info!("removes seen by hook: {}", removes.load(Ordering::Relaxed));
    info!(
        "stats: {}",
        serde_json::to_string(&cache.stats()).expect("stats serialize")
    );
}

/// Shows entries in a recency cache dying once their lifetime elapses.
fn lru_with_ttl_demo() {
    info!("--- LRU with TTL mode ---");

    let config = CacheConfig::new()
        .ttl(Duration::from_millis(200))
        .max_entries(20);
    let cache: Cache<u32, String> = Cache::lru_with_ttl(config);

    cache.add(1, "short lived".to_string());
    match cache.get(&1) {
        Some(value) => info!("key 1 before expiry: {}", value),
        None => info!("key 1 missing before expiry"),
    }

    sleep(Duration::from_millis(250));

    match cache.get(&1) {
        Some(_) => info!("key 1 unexpectedly alive"),
        None => info!("key 1 expired and was dropped on read"),
    }
    info!("size after expiry read: {}", cache.size());
}

/// Shows refresh-on-read keeping an entry alive past its original deadline.
fn ttl_demo() {
    info!("--- TTL mode (update age on get) ---");

    let config = CacheConfig::new()
        .ttl(Duration::from_millis(200))
        .max_entries(20);
    let cache: Cache<u32, String> = Cache::ttl(config, true);

    cache.add(1, "refreshed on read".to_string());
    cache.add(2, "never read".to_string());

    sleep(Duration::from_millis(120));
    if cache.get(&1).is_some() {
        info!("key 1 read at t+120ms, deadline pushed out");
    }

    sleep(Duration::from_millis(120));

    // t+240ms: key 2 is past its deadline, key 1 was refreshed at t+120ms
    match cache.get(&1) {
        Some(value) => info!("key 1 still alive: {}", value),
        None => info!("key 1 unexpectedly expired"),
    }
    match cache.get(&2) {
        Some(_) => info!("key 2 unexpectedly alive"),
        None => info!("key 2 expired at its original deadline"),
    }

    info!(
        "stats: {}",
        serde_json::to_string(&cache.stats()).expect("stats serialize")
    );
}
