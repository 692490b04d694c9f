//! Configuration Module
//!
//! Cache construction parameters, mode defaults, and change-notification
//! callbacks.

use std::env;
use std::fmt;
use std::time::Duration;

// == Defaults ==
/// Entry lifetime substituted when a TTL-bearing mode is selected but the
/// configuration leaves the TTL unset or zero.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

type Hook = Box<dyn Fn() + Send + Sync + 'static>;

// == Change Callbacks ==
/// Optional fire-and-forget hooks invoked on cache operations.
///
/// Hooks take no arguments, return nothing, and run synchronously on the
/// calling thread while the cache lock is held, so they should be quick.
/// An unset hook is skipped.
#[derive(Default)]
pub struct ChangeCallbacks {
    add: Option<Hook>,
    get: Option<Hook>,
    remove: Option<Hook>,
}

impl ChangeCallbacks {
    /// Creates an empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook fired on every `add` call.
    pub fn on_add(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.add = Some(Box::new(hook));
        self
    }

    /// Sets the hook fired on every `get` call.
    pub fn on_get(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.get = Some(Box::new(hook));
        self
    }

    /// Sets the hook fired on every `remove` call.
    pub fn on_remove(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.remove = Some(Box::new(hook));
        self
    }

    pub(crate) fn notify_add(&self) {
        if let Some(hook) = &self.add {
            hook();
        }
    }

    pub(crate) fn notify_get(&self) {
        if let Some(hook) = &self.get {
            hook();
        }
    }

    pub(crate) fn notify_remove(&self) {
        if let Some(hook) = &self.remove {
            hook();
        }
    }
}

impl fmt::Debug for ChangeCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeCallbacks")
            .field("add", &self.add.is_some())
            .field("get", &self.get.is_some())
            .field("remove", &self.remove.is_some())
            .finish()
    }
}

// == Cache Config ==
/// Construction parameters for a cache instance.
///
/// The mode constructors on [`crate::Cache`] consume one of these; the
/// defaulting here is the only logic the selector performs, and the engines
/// always receive fully-resolved parameters.
#[derive(Debug, Default)]
pub struct CacheConfig {
    /// Entry lifetime for the TTL-bearing modes; `None` = unset
    pub ttl: Option<Duration>,
    /// Maximum number of entries, 0 = unbounded
    pub max_entries: usize,
    /// Change-notification hooks
    pub callbacks: ChangeCallbacks,
}

impl CacheConfig {
    /// Creates a config with no TTL, no entry bound, and no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry lifetime.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the maximum entry count (0 = unbounded).
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the change-notification hooks.
    pub fn callbacks(mut self, callbacks: ChangeCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Creates a config from environment variables, leaving callbacks
    /// unset.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - entry lifetime in seconds (default: unset)
    /// - `CACHE_MAX_ENTRIES` - maximum entry count (default: 0, unbounded)
    ///
    /// Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            ttl: env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            callbacks: ChangeCallbacks::new(),
        }
    }

    /// The configured TTL, with unset or zero silently replaced by
    /// [`DEFAULT_TTL`].
    pub(crate) fn resolved_ttl(&self) -> Duration {
        match self.ttl {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => DEFAULT_TTL,
        }
    }
}
