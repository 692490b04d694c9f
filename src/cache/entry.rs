//! Cache Entry Module
//!
//! Defines the stored record shared by both eviction engines.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A stored value together with its expiry deadline.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiry instant, None = never expires
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry whose deadline is `now + ttl`, or one that never
    /// expires when `ttl` is `None`.
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry's deadline has passed.
    ///
    /// Boundary condition: an entry counts as expired once the current
    /// instant is greater than or equal to its deadline, so a fully elapsed
    /// TTL expires the entry immediately.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }

    // == Refresh ==
    /// Recomputes the deadline from the current instant.
    pub fn refresh(&mut self, ttl: Option<Duration>) {
        self.expires_at = ttl.map(|d| Instant::now() + d);
    }
}
