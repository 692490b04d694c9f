//! Cache Facade Module
//!
//! The public, thread-safe entry point wrapping a selected eviction engine.

use std::hash::Hash;

use parking_lot::Mutex;

use crate::cache::{CacheStats, Engine, LruEngine, TtlEngine};
use crate::config::{CacheConfig, ChangeCallbacks};

// == Cache ==
/// A keyed in-process cache with a mode-selected eviction engine.
///
/// All operations serialize on one exclusion lock, so a `Cache` shared
/// across threads (e.g. in an `Arc`) is safe but not concurrent. Change
/// callbacks fire synchronously on the calling thread while the lock is
/// held. The engine is never reachable except through these methods.
pub struct Cache<K, V> {
    /// The selected engine, guarded end-to-end
    engine: Mutex<Engine<K, V>>,
    /// Optional change-notification hooks
    callbacks: ChangeCallbacks,
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
    // == Mode Constructors ==
    /// Creates a recency cache: bounded by entry count, entries never
    /// expire.
    pub fn lru(config: CacheConfig) -> Self {
        let engine = Engine::Lru(LruEngine::new(config.max_entries, None));
        Self::with_engine(engine, config.callbacks)
    }

    /// Creates a recency cache whose entries also expire. An unset (or
    /// zero) TTL is silently replaced by [`crate::config::DEFAULT_TTL`].
    pub fn lru_with_ttl(config: CacheConfig) -> Self {
        let ttl = config.resolved_ttl();
        let engine = Engine::Lru(LruEngine::new(config.max_entries, Some(ttl)));
        Self::with_engine(engine, config.callbacks)
    }

    /// Creates a pure expiration cache. An unset (or zero) TTL is silently
    /// replaced by [`crate::config::DEFAULT_TTL`]; `update_age_on_get`
    /// makes successful reads refresh the entry's deadline.
    pub fn ttl(config: CacheConfig, update_age_on_get: bool) -> Self {
        let ttl = config.resolved_ttl();
        let engine = Engine::Ttl(TtlEngine::new(config.max_entries, ttl, update_age_on_get));
        Self::with_engine(engine, config.callbacks)
    }

    fn with_engine(engine: Engine<K, V>, callbacks: ChangeCallbacks) -> Self {
        Self {
            engine: Mutex::new(engine),
            callbacks,
        }
    }

    // == Add ==
    /// Stores a key-value pair, then fires the add hook if one is set.
    pub fn add(&self, key: K, value: V) {
        let mut engine = self.engine.lock();
        engine.insert(key, value);
        self.callbacks.notify_add();
    }

    // == Get ==
    /// Retrieves a value by key, or `None` when absent or expired.
    ///
    /// The get hook, if set, fires before the engine is consulted.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut engine = self.engine.lock();
        self.callbacks.notify_get();
        engine.lookup(key)
    }

    // == Remove ==
    /// Deletes an entry by key, then fires the remove hook if one is set.
    /// The hook fires once per call whether or not the key was present.
    pub fn remove(&self, key: &K) {
        let mut engine = self.engine.lock();
        engine.remove(key);
        self.callbacks.notify_remove();
    }

    // == Size ==
    /// Returns the number of live entries, without sweeping expired ones.
    pub fn size(&self) -> usize {
        self.engine.lock().count()
    }

    // == Clear ==
    /// Drops every entry; the cache behaves as freshly constructed
    /// afterwards. No hook fires.
    pub fn clear(&self) {
        self.engine.lock().clear();
    }

    // == Stats ==
    /// Returns a snapshot of the cache's performance counters.
    pub fn stats(&self) -> CacheStats {
        self.engine.lock().stats()
    }
}
