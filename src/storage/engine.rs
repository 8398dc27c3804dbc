//! Thread-Safe Cache Engine with Whole-Cache Expiry
//!
//! This module implements the core of stalecache: a `HashMap` behind a
//! single `RwLock`, where every entry shares the same TTL.
//!
//! ## Design Decisions
//!
//! 1. **One Lock**: Reads (`get`, `item_count`) share the lock, every mutation
//!    takes it exclusively. `replace` checks and writes under one acquisition.
//! 2. **No Lazy Expiry**: Expired entries are still returned by `get`. They are
//!    only removed by an explicit `delete_expired`.
//! 3. **Notifier Owned By The Cache**: The background task is stopped when the
//!    cache is dropped.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Cache<V>                   │
//! │  ┌────────────────────────────┐              │
//! │  │ RwLock<HashMap<String,     │   Arc<Slot>  │
//! │  │        Entry<V>>>          │ ◄──────────┐ │
//! │  └────────────────────────────┘            │ │
//! └────────────────────────────────────────────┼─┘
//!                                              │
//!                              ┌───────────────┴───────┐
//!                              │       Notifier        │
//!                              │ (Background Task)     │
//!                              └───────────────────────┘
//! ```
//!
//! Share a cache between threads by wrapping it in an `Arc`.

use crate::config::CacheConfig;
use crate::error::NotFoundError;
use crate::storage::notifier::{CallbackSlot, Notifier};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::debug;

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    /// The actual value stored
    value: V,
    /// When this entry expires (None = never expires)
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    /// Creates a new entry that expires `ttl` from now, or never if `ttl` is `None`.
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        Self {
            value,
            // An expiry too far away to represent is treated as never
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    /// Returns the stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry and returns the value.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns when this entry expires, or `None` if it never does.
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    #[inline]
    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    /// Returns the time left before expiry, or `None` if no expiry.
    ///
    /// Already expired entries report `Duration::ZERO`.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }
}

/// A thread-safe key-value cache where all entries share one TTL.
///
/// # Example
///
/// ```
/// use stalecache::Cache;
/// use std::time::Duration;
///
/// // No expiry: no background task is started
/// let cache = Cache::new(Duration::ZERO);
///
/// cache.set("name", "Ariz");
/// assert_eq!(cache.get("name"), Some("Ariz"));
///
/// assert!(cache.replace("missing", "x").is_err());
/// assert_eq!(cache.item_count(), 1);
/// ```
pub struct Cache<V> {
    /// Lifetime of every entry (None = never expires)
    ttl: Option<Duration>,

    /// The entries
    data: RwLock<HashMap<String, Entry<V>>>,

    /// Callback invoked by the notifier
    callback: Arc<CallbackSlot>,

    /// Background notifier, present only when a TTL is set
    notifier: Option<Notifier>,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: GETs that found the key
    hit_count: AtomicU64,

    /// Statistics: total SET operations
    set_count: AtomicU64,

    /// Statistics: successful REPLACE operations
    replace_count: AtomicU64,

    /// Statistics: DELETE operations that removed a key
    del_count: AtomicU64,

    /// Statistics: number of expired entries purged
    expired_count: AtomicU64,
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("ttl", &self.ttl)
            .field("entries", &self.item_count())
            .field("callback", &self.callback)
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl<V> Default for Cache<V> {
    /// A cache whose entries never expire.
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}

impl<V> Cache<V> {
    /// Creates a cache whose entries expire `ttl` after they are written.
    ///
    /// A zero `ttl` means entries never expire and no notifier is started.
    /// Otherwise the notifier runs on its own thread, independent of any
    /// Tokio runtime the caller is in, and stops only when the cache is
    /// dropped or shut down.
    pub fn new(ttl: Duration) -> Self {
        Self::with_config(CacheConfig::new(ttl))
    }

    /// Creates a cache from a full configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        let mut cache = Self::unstarted(&config);
        if let Some(interval) = config.notifier_interval() {
            cache.notifier = Notifier::start(interval, Arc::clone(&cache.callback), config.name);
        }
        cache
    }

    /// Creates a cache whose notifier runs as a task on the given runtime
    /// instead of its own thread.
    ///
    /// The notifier then also stops when that runtime shuts down.
    pub fn with_config_on(config: CacheConfig, handle: &Handle) -> Self {
        let mut cache = Self::unstarted(&config);
        if let Some(interval) = config.notifier_interval() {
            cache.notifier = Some(Notifier::start_on(
                interval,
                Arc::clone(&cache.callback),
                config.name,
                handle,
            ));
        }
        cache
    }

    fn unstarted(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl(),
            data: RwLock::new(HashMap::new()),
            callback: Arc::new(CallbackSlot::default()),
            notifier: None,
            get_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            replace_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<V>>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<V>>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the TTL applied to new entries, or `None` if they never expire.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Sets a key-value pair, replacing any existing entry.
    ///
    /// The entry expires one TTL from now.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let entry = Entry::new(value, self.ttl);
        self.write().insert(key.into(), entry);
    }

    /// Sets a new value for a key only if it already exists.
    ///
    /// The expiry is reset relative to now. The existence check and the
    /// write happen under the same lock acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if the key is absent; the cache is unchanged.
    pub fn replace(&self, key: &str, value: V) -> Result<(), NotFoundError> {
        let mut data = self.write();

        match data.get_mut(key) {
            Some(entry) => {
                *entry = Entry::new(value, self.ttl);
                self.replace_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => Err(NotFoundError::new(key)),
        }
    }

    /// Deletes a key. Does nothing if the key is not in the cache.
    ///
    /// # Returns
    ///
    /// Returns `true` if the key was deleted, `false` if it didn't exist.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.write().remove(key);

        if removed.is_some() {
            self.del_count.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Removes every expired entry.
    ///
    /// This is never called automatically. Call it directly or from the
    /// expiration callback.
    ///
    /// # Returns
    ///
    /// Returns the number of entries that were removed.
    pub fn delete_expired(&self) -> u64 {
        if self.ttl.is_none() {
            return 0;
        }

        let now = Instant::now();
        let purged = {
            let mut data = self.write();
            let before = data.len();
            data.retain(|_, entry| !entry.is_expired_at(now));
            (before - data.len()) as u64
        };

        if purged > 0 {
            self.expired_count.fetch_add(purged, Ordering::Relaxed);
            debug!(purged, "Expired entries deleted");
        }

        purged
    }

    /// Returns the number of entries, including expired ones.
    pub fn item_count(&self) -> usize {
        self.read().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Checks if a key is present, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Reports whether a key has expired, or `None` if it is absent.
    pub fn is_expired(&self, key: &str) -> Option<bool> {
        self.read().get(key).map(Entry::is_expired)
    }

    /// Returns a snapshot of all keys, expired or not.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Deletes all entries.
    pub fn flush(&self) {
        let old = std::mem::take(&mut *self.write());

        // Values are dropped outside the lock
        debug!(flushed = old.len(), "Cache flushed");
    }

    /// Registers the callback the notifier invokes once per TTL period.
    ///
    /// Replaces any previous callback. It is never called from this method,
    /// and never called at all when the cache has no TTL.
    ///
    /// The callback runs on the notifier task without any cache lock held,
    /// so it may call back into the cache. To do that without keeping the
    /// cache alive forever, capture a `Weak` reference:
    ///
    /// ```
    /// use stalecache::Cache;
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let cache: Arc<Cache<u32>> = Arc::new(Cache::new(Duration::ZERO));
    /// let weak = Arc::downgrade(&cache);
    /// cache.set_expired_callback(move || {
    ///     if let Some(cache) = weak.upgrade() {
    ///         cache.delete_expired();
    ///     }
    /// });
    /// ```
    pub fn set_expired_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callback.set(Some(Arc::new(callback)));
    }

    /// Removes the registered callback. Later ticks become no-ops.
    pub fn clear_expired_callback(&self) {
        self.callback.set(None);
    }

    /// Returns the notifier, if one was started.
    pub fn notifier(&self) -> Option<&Notifier> {
        self.notifier.as_ref()
    }

    /// Returns true while the notifier is running.
    pub fn notifier_running(&self) -> bool {
        self.notifier.as_ref().is_some_and(Notifier::is_running)
    }

    /// Stops the notifier without waiting for it.
    ///
    /// Dropping the cache does the same. The cache itself stays usable.
    pub fn shutdown(&self) {
        if let Some(notifier) = &self.notifier {
            notifier.stop();
        }
    }

    /// Stops the notifier and waits for its task to exit.
    ///
    /// After this returns the callback will not be invoked again.
    pub async fn close(&mut self) {
        if let Some(notifier) = self.notifier.take() {
            notifier.join().await;
        }
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let get_ops = self.get_count.load(Ordering::Relaxed);
        let hits = self.hit_count.load(Ordering::Relaxed);

        CacheStats {
            entries: self.item_count(),
            get_ops,
            hits,
            misses: get_ops.saturating_sub(hits),
            set_ops: self.set_count.load(Ordering::Relaxed),
            replace_ops: self.replace_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
            notifications: self.callback.fired(),
        }
    }
}

impl<V: Clone> Cache<V> {
    /// Gets the value for a key.
    ///
    /// Expired entries are returned like any other; this cache never evicts
    /// on read.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let value = self.read().get(key).map(|entry| entry.value.clone());

        if value.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Gets the value together with its expiry time.
    pub fn get_with_expiration(&self, key: &str) -> Option<(V, Option<Instant>)> {
        self.get_entry(key)
            .map(|entry| (entry.value, entry.expires_at))
    }

    /// Gets the full entry for a key.
    pub fn get_entry(&self, key: &str) -> Option<Entry<V>> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let entry = self.read().get(key).cloned();

        if entry.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }
        entry
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently stored, expired or not
    pub entries: usize,
    /// Total GET operations
    pub get_ops: u64,
    /// GETs that found the key
    pub hits: u64,
    /// GETs that did not
    pub misses: u64,
    /// Total SET operations
    pub set_ops: u64,
    /// Successful REPLACE operations
    pub replace_ops: u64,
    /// DELETE operations that removed a key
    pub del_ops: u64,
    /// Total expired entries purged
    pub expired: u64,
    /// Callback invocations by the notifier
    pub notifications: u64,
}
