//! Thread-safe handle over a single-threaded cache
//!
//! A `put` is a multi-step sequence (index check, possible eviction, insert)
//! and list splicing is not atomic with respect to the index, so the whole
//! cache sits behind one lock and every call holds it from start to finish.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::Cache;
use crate::policy::Policy;
use crate::stats::StatsSnapshot;

/// Cloneable, lock-guarded cache handle
pub struct SharedCache<C> {
    inner: Arc<Mutex<C>>,
}

impl<C> Clone for SharedCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> SharedCache<C> {
    /// Wrap a cache
    pub fn new(cache: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Run `f` with exclusive access, for compound operations that must not
    /// interleave with other callers
    pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        let mut cache = self.inner.lock();
        f(&mut *cache)
    }

    /// Get a copy of a value, counting the access
    pub fn get<K, V>(&self, key: &K) -> Option<V>
    where
        C: Cache<K, V>,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Insert or update a key
    pub fn put<K, V>(&self, key: K, value: V)
    where
        C: Cache<K, V>,
    {
        self.inner.lock().put(key, value)
    }

    /// Remove a key and return its value
    pub fn remove<K, V>(&self, key: &K) -> Option<V>
    where
        C: Cache<K, V>,
    {
        self.inner.lock().remove(key)
    }

    /// Number of resident entries
    pub fn len<K, V>(&self) -> usize
    where
        C: Cache<K, V>,
    {
        self.inner.lock().len()
    }

    /// Maximum number of entries
    pub fn capacity<K, V>(&self) -> usize
    where
        C: Cache<K, V>,
    {
        self.inner.lock().capacity()
    }

    /// Eviction policy of the wrapped cache
    pub fn policy<K, V>(&self) -> Policy
    where
        C: Cache<K, V>,
    {
        self.inner.lock().policy()
    }

    /// Copy of the current statistics
    pub fn stats<K, V>(&self) -> StatsSnapshot
    where
        C: Cache<K, V>,
    {
        self.inner.lock().stats().snapshot()
    }

    /// Drop every entry
    pub fn clear<K, V>(&self)
    where
        C: Cache<K, V>,
    {
        self.inner.lock().clear()
    }
}
