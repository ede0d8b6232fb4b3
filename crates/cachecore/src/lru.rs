//! LRU (Least Recently Used) cache implementation
//!
//! Entries live in one [`IntrusiveList`] ordered least recent (head) to most
//! recent (tail). The key index maps straight to list handles, so promotion
//! and eviction never scan.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::cache::{checked_capacity, in_sync, Cache};
use crate::error::Result;
use crate::list::{IntrusiveList, NodeArena, NodeId};
use crate::policy::Policy;
use crate::stats::CacheStats;

/// Slots reserved up front; larger caches grow on demand
const PREALLOC_LIMIT: usize = 4096;

struct Entry<K, V> {
    key: K,
    value: V,
}

/// LRU cache with fixed capacity
pub struct LruCache<K, V> {
    index: HashMap<K, NodeId, RandomState>,
    arena: NodeArena<Entry<K, V>>,
    order: IntrusiveList,
    capacity: usize,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// A capacity of 0 yields a cache that never stores anything.
    pub fn new(capacity: usize) -> Self {
        let prealloc = capacity.min(PREALLOC_LIMIT);
        let mut arena = NodeArena::with_capacity(prealloc + 1);
        let order = IntrusiveList::new(&mut arena);

        Self {
            index: HashMap::with_capacity_and_hasher(prealloc, RandomState::new()),
            arena,
            order,
            capacity,
            stats: CacheStats::new(),
        }
    }

    /// Create a new LRU cache from a signed capacity
    ///
    /// # Errors
    /// * [`InvalidCapacity`](crate::Error::InvalidCapacity) if `capacity` is negative
    pub fn try_new(capacity: i64) -> Result<Self> {
        checked_capacity(capacity).map(Self::new)
    }

    /// Get a value and mark it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&id) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.promote(id);
        self.stats.record_hit();
        self.arena.get(id).map(|entry| &entry.value)
    }

    /// Insert or update a key-value pair
    ///
    /// Updating an existing key also marks it most recently used. Inserting
    /// into a full cache evicts the least recently used entry first.
    pub fn put(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }

        if let Some(&id) = self.index.get(&key) {
            self.promote(id);
            if let Some(entry) = self.arena.get_mut(id) {
                entry.value = value;
            }
            self.stats.record_update();
            return;
        }

        if self.index.len() == self.capacity {
            self.evict();
        }

        let id = self.arena.insert(Entry {
            key: key.clone(),
            value,
        });
        in_sync(self.order.append(&mut self.arena, id), Policy::Lru);
        self.index.insert(key, id);
        self.stats.record_insert();
    }

    /// Get a value without changing its recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.index
            .get(key)
            .and_then(|&id| self.arena.get(id))
            .map(|entry| &entry.value)
    }

    /// Check whether a key is resident without changing its recency
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Remove a key from the cache
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        in_sync(self.order.remove_node(&mut self.arena, id), Policy::Lru);
        let entry = in_sync(self.arena.release(id), Policy::Lru);
        Some(entry.value)
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.order.is_empty() {
            return None;
        }
        let entry = self.detach_head();
        Some((entry.key, entry.value))
    }

    /// The entry the next eviction would drop
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.order
            .head(&self.arena)
            .and_then(|id| self.arena.get(id))
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Iterate entries from least to most recently used
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order
            .iter(&self.arena)
            .map(|(_, entry)| (&entry.key, &entry.value))
    }

    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get the cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Clear the cache and its statistics
    pub fn clear(&mut self) {
        self.index.clear();
        self.arena.clear();
        self.order = IntrusiveList::new(&mut self.arena);
        self.stats.reset();
    }

    fn promote(&mut self, id: NodeId) {
        let id = in_sync(self.order.remove_node(&mut self.arena, id), Policy::Lru);
        in_sync(self.order.append(&mut self.arena, id), Policy::Lru);
        trace!(len = self.order.len(), "lru promote");
    }

    fn evict(&mut self) {
        self.detach_head();
        self.stats.record_eviction();
        debug!(len = self.index.len(), capacity = self.capacity, "lru eviction");
    }

    fn detach_head(&mut self) -> Entry<K, V> {
        let id = in_sync(self.order.remove_head(&mut self.arena), Policy::Lru);
        let entry = in_sync(self.arena.release(id), Policy::Lru);
        self.index.remove(&entry.key);
        entry
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        LruCache::get(self, key)
    }

    fn put(&mut self, key: K, value: V) {
        LruCache::put(self, key, value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        LruCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LruCache::contains(self, key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        LruCache::remove(self, key)
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn capacity(&self) -> usize {
        LruCache::capacity(self)
    }

    fn clear(&mut self) {
        LruCache::clear(self)
    }

    fn stats(&self) -> &CacheStats {
        LruCache::stats(self)
    }

    fn policy(&self) -> Policy {
        Policy::Lru
    }
}
