//! Polycache - an in-process keyed cache with interchangeable eviction policies
//!
//! Provides three cache modes behind a single thread-safe facade: recency
//! eviction (LRU), expiration (TTL), and LRU with per-entry expiry.

pub mod cache;
pub mod config;

pub use cache::{Cache, CacheStats};
pub use config::{CacheConfig, ChangeCallbacks, DEFAULT_TTL};
