//! Expiry Engine Module
//!
//! Keeps entries until their deadline passes, with a secondary index from
//! expiry instant to key so over-capacity inserts can purge in expiry order.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats};

// == TTL Engine ==
/// Expiration-ordered cache engine.
///
/// The primary store maps keys to entries; the secondary index maps each
/// registered expiry instant to the keys due at that instant, ascending.
/// Several keys can land on one instant (inserts within the same clock
/// tick), so the index buckets them and purges bucket members in insertion
/// order.
#[derive(Debug)]
pub(crate) struct TtlEngine<K, V> {
    /// Primary key-value store
    entries: HashMap<K, CacheEntry<V>>,
    /// Expiry instant to the keys due at that instant
    expirations: BTreeMap<Instant, Vec<K>>,
    /// Resolved entry lifetime
    ttl: Duration,
    /// Maximum live entries, 0 = unbounded
    max_entries: usize,
    /// Whether a successful lookup refreshes the entry's deadline
    update_age_on_get: bool,
    stats: CacheStats,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlEngine<K, V> {
    // == Constructor ==
    /// Creates an empty engine with a resolved lifetime and entry bound.
    pub fn new(max_entries: usize, ttl: Duration, update_age_on_get: bool) -> Self {
        Self {
            entries: HashMap::new(),
            expirations: BTreeMap::new(),
            ttl,
            max_entries,
            update_age_on_get,
            stats: CacheStats::new(),
        }
    }

    // == Insert ==
    /// Stores a key-value pair expiring one lifetime from now.
    ///
    /// An existing key has its value overwritten and its deadline refreshed,
    /// re-registering it under the new instant. If the engine is bounded and
    /// the insertion pushed it past the bound, a capacity purge runs.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            self.refresh_deadline(&key);
            return;
        }

        let entry = CacheEntry::new(value, Some(self.ttl));
        if let Some(at) = entry.expires_at {
            self.expirations.entry(at).or_default().push(key.clone());
        }
        self.entries.insert(key, entry);

        if self.max_entries != 0 && self.entries.len() > self.max_entries {
            self.purge_to_capacity();
        }
    }

    // == Lookup ==
    /// Retrieves a value by key.
    ///
    /// An entry whose deadline has passed is removed on the spot and
    /// reported as absent. When configured to update age on get, a
    /// successful lookup refreshes the deadline exactly as insert does.
    pub fn lookup(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            return None;
        }

        if self.update_age_on_get {
            self.refresh_deadline(key);
        }
        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Remove ==
    /// Deletes an entry from the primary store and deregisters its instant
    /// from the index; no-op when the key is absent.
    pub fn remove(&mut self, key: &K) {
        if let Some(entry) = self.entries.remove(key) {
            if let Some(at) = entry.expires_at {
                self.deregister(at, key);
            }
        }
    }

    // == Count ==
    /// Returns the number of live entries. Expired entries that were never
    /// looked up again still count.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    // == Clear ==
    /// Drops all entries and index registrations. Counters keep
    /// accumulating across clears.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.expirations.clear();
    }

    // == Stats ==
    /// Returns a snapshot of the engine's counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Refresh Deadline ==
    /// Moves an entry's index registration from its old instant to a fresh
    /// `now + ttl` deadline. The old instant must be deregistered first or
    /// the entry would stay reachable under a stale instant.
    fn refresh_deadline(&mut self, key: &K) {
        let old = match self.entries.get(key) {
            Some(entry) => entry.expires_at,
            None => return,
        };
        if let Some(at) = old {
            self.deregister(at, key);
        }
        if let Some(entry) = self.entries.get_mut(key) {
            entry.refresh(Some(self.ttl));
            if let Some(at) = entry.expires_at {
                self.expirations.entry(at).or_default().push(key.clone());
            }
        }
    }

    // == Capacity Purge ==
    /// Walks the index in ascending instant order, evicting until the
    /// engine is back within its bound.
    ///
    /// Already-expired entries are always removed, regardless of the bound;
    /// past those, the earliest-expiring live entries go until the size
    /// constraint holds. The walk stops at the first key whose instant is in
    /// the future once the bound is satisfied.
    fn purge_to_capacity(&mut self) {
        let now = Instant::now();
        let mut victims = Vec::new();
        let mut remaining = self.entries.len();

        'walk: for (&at, keys) in &self.expirations {
            for key in keys {
                if remaining <= self.max_entries && at > now {
                    break 'walk;
                }
                victims.push((key.clone(), at <= now));
                remaining -= 1;
            }
        }

        let purged = victims.len();
        for (key, was_expired) in victims {
            self.remove(&key);
            if was_expired {
                self.stats.record_expiration();
            } else {
                self.stats.record_eviction();
            }
        }
        debug!("capacity purge removed {} entries", purged);
    }

    // == Deregister ==
    /// Drops one key from an instant's bucket, removing the bucket when it
    /// empties.
    fn deregister(&mut self, at: Instant, key: &K) {
        if let Some(keys) = self.expirations.get_mut(&at) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.expirations.remove(&at);
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const LONG_TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_engine_new() {
        let engine: TtlEngine<String, String> = TtlEngine::new(0, LONG_TTL, false);
        assert_eq!(engine.count(), 0);
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut engine = TtlEngine::new(0, LONG_TTL, false);

        engine.insert("key1".to_string(), "value1".to_string());

        assert_eq!(engine.lookup(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(engine.count(), 1);
    }

    #[test]
    fn test_lookup_missing_key() {
        let mut engine: TtlEngine<String, String> = TtlEngine::new(0, LONG_TTL, false);

        assert_eq!(engine.lookup(&"nope".to_string()), None);
    }

    #[test]
    fn test_overwrite_keeps_single_registration() {
        let mut engine = TtlEngine::new(0, LONG_TTL, false);

        engine.insert("key1".to_string(), "value1".to_string());
        engine.insert("key1".to_string(), "value2".to_string());

        assert_eq!(engine.count(), 1);
        assert_eq!(engine.lookup(&"key1".to_string()), Some("value2".to_string()));

        // The old instant must have been deregistered
        let registered: usize = engine.expirations.values().map(Vec::len).sum();
        assert_eq!(registered, 1);
    }

    #[test]
    fn test_expired_entry_removed_on_lookup() {
        let mut engine = TtlEngine::new(0, Duration::from_millis(30), false);

        engine.insert("key1", 1);
        sleep(Duration::from_millis(50));

        assert_eq!(engine.count(), 1, "no sweep before the lookup");
        assert_eq!(engine.lookup(&"key1"), None);
        assert_eq!(engine.count(), 0);
        assert!(engine.expirations.is_empty());
    }

    #[test]
    fn test_overwrite_refreshes_deadline() {
        let mut engine = TtlEngine::new(0, Duration::from_millis(50), false);

        engine.insert("key1", 1);
        sleep(Duration::from_millis(30));
        engine.insert("key1", 2);
        sleep(Duration::from_millis(30));

        // Past the original deadline, alive under the refreshed one
        assert_eq!(engine.lookup(&"key1"), Some(2));
    }

    #[test]
    fn test_update_age_on_get_keeps_entry_alive() {
        let mut engine = TtlEngine::new(0, Duration::from_millis(60), true);

        engine.insert("key1", 1);
        sleep(Duration::from_millis(40));
        assert_eq!(engine.lookup(&"key1"), Some(1));
        sleep(Duration::from_millis(40));

        // Past the original deadline, the read refreshed it
        assert_eq!(engine.lookup(&"key1"), Some(1));
    }

    #[test]
    fn test_without_update_age_entry_dies_at_original_deadline() {
        let mut engine = TtlEngine::new(0, Duration::from_millis(60), false);

        engine.insert("key1", 1);
        sleep(Duration::from_millis(40));
        assert_eq!(engine.lookup(&"key1"), Some(1));
        sleep(Duration::from_millis(40));

        assert_eq!(engine.lookup(&"key1"), None);
    }

    #[test]
    fn test_remove_deregisters_instant() {
        let mut engine = TtlEngine::new(0, LONG_TTL, false);

        engine.insert("key1", 1);
        engine.remove(&"key1");

        assert_eq!(engine.count(), 0);
        assert!(engine.expirations.is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let mut engine = TtlEngine::new(0, LONG_TTL, false);

        engine.insert("key1", 1);
        engine.remove(&"ghost");

        assert_eq!(engine.count(), 1);
    }

    #[test]
    fn test_purge_evicts_earliest_expiring_first() {
        let mut engine = TtlEngine::new(3, LONG_TTL, false);

        engine.insert("a", 1);
        sleep(Duration::from_millis(5));
        engine.insert("b", 2);
        sleep(Duration::from_millis(5));
        engine.insert("c", 3);
        sleep(Duration::from_millis(5));
        engine.insert("d", 4);

        assert_eq!(engine.count(), 3);
        assert_eq!(engine.lookup(&"a"), None, "earliest deadline goes first");
        assert_eq!(engine.lookup(&"b"), Some(2));
        assert_eq!(engine.lookup(&"c"), Some(3));
        assert_eq!(engine.lookup(&"d"), Some(4));
    }

    #[test]
    fn test_purge_removes_all_expired_entries() {
        let mut engine = TtlEngine::new(3, Duration::from_millis(30), false);

        engine.insert("a", 1);
        engine.insert("b", 2);
        engine.insert("c", 3);
        sleep(Duration::from_millis(50));

        // The overflow insert purges every expired entry, not just enough
        // of them to satisfy the bound
        engine.insert("d", 4);

        assert_eq!(engine.count(), 1);
        assert_eq!(engine.lookup(&"d"), Some(4));
    }

    #[test]
    fn test_same_instant_keys_both_survive_and_purge_in_order() {
        let mut engine = TtlEngine::new(1, LONG_TTL, false);

        // Back-to-back inserts may land on the same clock tick; both keys
        // must stay reachable and purge in insertion order
        engine.insert("a", 1);
        engine.insert("b", 2);

        assert_eq!(engine.count(), 1);
        assert_eq!(engine.lookup(&"a"), None);
        assert_eq!(engine.lookup(&"b"), Some(2));
    }

    #[test]
    fn test_unbounded_never_purges() {
        let mut engine = TtlEngine::new(0, LONG_TTL, false);

        for n in 0..500 {
            engine.insert(n, n);
        }

        assert_eq!(engine.count(), 500);
        assert_eq!(engine.lookup(&0), Some(0));
    }

    #[test]
    fn test_clear_resets_engine() {
        let mut engine = TtlEngine::new(0, LONG_TTL, false);

        engine.insert("a", 1);
        engine.insert("b", 2);
        engine.clear();

        assert_eq!(engine.count(), 0);
        assert!(engine.expirations.is_empty());
        assert_eq!(engine.lookup(&"a"), None);

        engine.insert("c", 3);
        assert_eq!(engine.lookup(&"c"), Some(3));
    }

    #[test]
    fn test_stats_distinguish_evictions_from_expirations() {
        let mut engine = TtlEngine::new(2, Duration::from_millis(30), false);

        engine.insert("a", 1);
        sleep(Duration::from_millis(50));

        // "a" is expired; "b" and "c" are live when "c" overflows the bound
        engine.insert("b", 2);
        engine.insert("c", 3);

        let stats = engine.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.total_entries, 2);
    }

    #[test]
    fn test_refresh_on_get_reorders_purge_candidates() {
        let mut engine = TtlEngine::new(2, LONG_TTL, true);

        engine.insert("a", 1);
        sleep(Duration::from_millis(5));
        engine.insert("b", 2);
        sleep(Duration::from_millis(5));

        // Reading "a" pushes its deadline past "b"'s
        engine.lookup(&"a");
        engine.insert("c", 3);

        assert_eq!(engine.lookup(&"b"), None);
        assert_eq!(engine.lookup(&"a"), Some(1));
        assert_eq!(engine.lookup(&"c"), Some(3));
    }
}
