//! LFU (Least Frequently Used) cache implementation
//!
//! Each access count has its own bucket, an [`IntrusiveList`] ordered oldest
//! to newest at that count. All buckets share one node arena. A `min_freq`
//! cursor names the bucket the next eviction comes from, and eviction takes
//! that bucket's head, so ties at the lowest count go to the least recently
//! touched entry.
//!
//! Buckets are dropped as soon as they empty, which keeps `min_freq` equal to
//! the smallest key in `buckets` whenever the cache is non-empty.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::cache::{checked_capacity, in_sync, Cache};
use crate::error::{Error, Result};
use crate::list::{IntrusiveList, NodeArena, NodeId};
use crate::policy::Policy;
use crate::stats::CacheStats;

/// Slots reserved up front; larger caches grow on demand
const PREALLOC_LIMIT: usize = 4096;

struct Entry<K, V> {
    key: K,
    value: V,
    freq: u64,
}

/// LFU cache with fixed capacity
pub struct LfuCache<K, V> {
    index: HashMap<K, NodeId, RandomState>,
    arena: NodeArena<Entry<K, V>>,
    buckets: HashMap<u64, IntrusiveList, RandomState>,
    min_freq: u64,
    capacity: usize,
    stats: CacheStats,
}

impl<K, V> LfuCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LFU cache with the given capacity
    ///
    /// A capacity of 0 yields a cache that never stores anything.
    pub fn new(capacity: usize) -> Self {
        let prealloc = capacity.min(PREALLOC_LIMIT);

        Self {
            index: HashMap::with_capacity_and_hasher(prealloc, RandomState::new()),
            arena: NodeArena::with_capacity(prealloc + 1),
            buckets: HashMap::with_hasher(RandomState::new()),
            min_freq: 0,
            capacity,
            stats: CacheStats::new(),
        }
    }

    /// Create a new LFU cache from a signed capacity
    ///
    /// # Errors
    /// * [`Error::InvalidCapacity`] if `capacity` is negative
    pub fn try_new(capacity: i64) -> Result<Self> {
        checked_capacity(capacity).map(Self::new)
    }

    /// Get a value and bump its access count
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&id) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.increment_frequency(id);
        self.stats.record_hit();
        self.arena.get(id).map(|entry| &entry.value)
    }

    /// Insert or update a key-value pair
    ///
    /// Updating an existing key counts as an access. New keys start at
    /// frequency 1; inserting into a full cache first evicts the oldest entry
    /// at the lowest frequency.
    pub fn put(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }

        if let Some(&id) = self.index.get(&key) {
            self.increment_frequency(id);
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
            freq: 1,
        });
        self.link(1, id);
        self.index.insert(key, id);
        self.min_freq = 1;
        self.stats.record_insert();
    }

    /// Get a value without changing its frequency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entry(key).map(|entry| &entry.value)
    }

    /// Check whether a key is resident without changing its frequency
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Access count of a resident key
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.entry(key).map(|entry| entry.freq)
    }

    /// Lowest access count among resident keys
    pub fn min_frequency(&self) -> Option<u64> {
        if self.index.is_empty() {
            None
        } else {
            Some(self.min_freq)
        }
    }

    /// Remove a key from the cache
    ///
    /// If this empties the lowest bucket, the cursor moves to the next
    /// lowest remaining frequency.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        let freq = self.freq_of(id);
        let bucket = self.buckets.get_mut(&freq).ok_or(Error::NodeNotInList);
        let bucket = in_sync(bucket, Policy::Lfu);
        in_sync(bucket.remove_node(&mut self.arena, id), Policy::Lfu);
        if self.discard_if_empty(freq) && freq == self.min_freq {
            self.recompute_min_freq();
        }
        let entry = in_sync(self.arena.release(id), Policy::Lfu);
        Some(entry.value)
    }

    /// Remove and return the entry the next eviction would drop
    pub fn pop_lfu(&mut self) -> Option<(K, V)> {
        if self.index.is_empty() {
            return None;
        }
        let (entry, emptied) = self.detach_min();
        if emptied {
            self.recompute_min_freq();
        }
        Some((entry.key, entry.value))
    }

    /// The entry the next eviction would drop
    pub fn peek_lfu(&self) -> Option<(&K, &V)> {
        self.buckets
            .get(&self.min_freq)
            .and_then(|bucket| bucket.head(&self.arena))
            .and_then(|id| self.arena.get(id))
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Iterate entries as `(key, value, frequency)`, lowest frequency first
    /// and oldest first within a frequency
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V, u64)> + '_ {
        let mut freqs: Vec<u64> = self.buckets.keys().copied().collect();
        freqs.sort_unstable();
        freqs.into_iter().flat_map(move |freq| {
            self.buckets[&freq]
                .iter(&self.arena)
                .map(|(_, entry)| (&entry.key, &entry.value, entry.freq))
        })
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
        self.buckets.clear();
        self.arena.clear();
        self.min_freq = 0;
        self.stats.reset();
    }

    fn entry(&self, key: &K) -> Option<&Entry<K, V>> {
        self.index.get(key).and_then(|&id| self.arena.get(id))
    }

    fn freq_of(&self, id: NodeId) -> u64 {
        let entry = in_sync(self.arena.get(id).ok_or(Error::NodeNotInList), Policy::Lfu);
        entry.freq
    }

    /// Move a node from its bucket to the next one up. Touches two buckets.
    fn increment_frequency(&mut self, id: NodeId) {
        let freq = self.freq_of(id);
        let bucket = self.buckets.get_mut(&freq).ok_or(Error::NodeNotInList);
        let bucket = in_sync(bucket, Policy::Lfu);
        in_sync(bucket.remove_node(&mut self.arena, id), Policy::Lfu);
        if self.discard_if_empty(freq) && freq == self.min_freq {
            self.min_freq = freq + 1;
        }

        if let Some(entry) = self.arena.get_mut(id) {
            entry.freq = freq + 1;
        }
        self.link(freq + 1, id);
        trace!(freq = freq + 1, "lfu promote");
    }

    /// Append a detached node to the bucket for `freq`, creating it if absent
    fn link(&mut self, freq: u64, id: NodeId) {
        let Self { buckets, arena, .. } = self;
        let bucket = buckets
            .entry(freq)
            .or_insert_with(|| IntrusiveList::new(&mut *arena));
        in_sync(bucket.append(arena, id), Policy::Lfu);
    }

    /// Drop the bucket for `freq` if it holds no nodes
    fn discard_if_empty(&mut self, freq: u64) -> bool {
        match self.buckets.get(&freq) {
            Some(bucket) if bucket.is_empty() => {}
            _ => return false,
        }
        if let Some(bucket) = self.buckets.remove(&freq) {
            in_sync(bucket.release(&mut self.arena), Policy::Lfu);
        }
        true
    }

    /// Only needed after removals outside `put`, which resets the cursor itself
    fn recompute_min_freq(&mut self) {
        self.min_freq = self.buckets.keys().copied().min().unwrap_or(0);
    }

    fn evict(&mut self) {
        let (entry, _) = self.detach_min();
        self.stats.record_eviction();
        debug!(freq = entry.freq, len = self.index.len(), "lfu eviction");
    }

    /// Unlink the head of the lowest bucket and forget its key
    ///
    /// Returns the entry and whether its bucket was emptied. The cursor is
    /// left for the caller to fix.
    fn detach_min(&mut self) -> (Entry<K, V>, bool) {
        let freq = self.min_freq;
        let bucket = self.buckets.get_mut(&freq).ok_or(Error::EmptyList);
        let bucket = in_sync(bucket, Policy::Lfu);
        let id = in_sync(bucket.remove_head(&mut self.arena), Policy::Lfu);
        let emptied = self.discard_if_empty(freq);
        let entry = in_sync(self.arena.release(id), Policy::Lfu);
        self.index.remove(&entry.key);
        (entry, emptied)
    }
}

impl<K, V> Cache<K, V> for LfuCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        LfuCache::get(self, key)
    }

    fn put(&mut self, key: K, value: V) {
        LfuCache::put(self, key, value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        LfuCache::peek(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LfuCache::contains(self, key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        LfuCache::remove(self, key)
    }

    fn len(&self) -> usize {
        LfuCache::len(self)
    }

    fn capacity(&self) -> usize {
        LfuCache::capacity(self)
    }

    fn clear(&mut self) {
        LfuCache::clear(self)
    }

    fn stats(&self) -> &CacheStats {
        LfuCache::stats(self)
    }

    fn policy(&self) -> Policy {
        Policy::Lfu
    }

    fn frequency(&self, key: &K) -> Option<u64> {
        LfuCache::frequency(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(cache: &LfuCache<&'static str, i32>) -> Vec<(&'static str, u64)> {
        cache.iter().map(|(k, _, f)| (*k, f)).collect()
    }

    /// Every resident key sits in the bucket of its own frequency and the
    /// cursor names the lowest non-empty bucket.
    fn assert_consistent<K: Hash + Eq + Clone, V>(cache: &LfuCache<K, V>) {
        let in_buckets: usize = cache.buckets.values().map(IntrusiveList::len).sum();
        assert_eq!(in_buckets, cache.index.len());
        assert!(cache.index.len() <= cache.capacity);
        for (freq, bucket) in &cache.buckets {
            assert!(!bucket.is_empty());
            for (_, entry) in bucket.iter(&cache.arena) {
                assert_eq!(entry.freq, *freq);
            }
        }
        if !cache.index.is_empty() {
            assert_eq!(cache.buckets.keys().min(), Some(&cache.min_freq));
        }
    }

    #[test]
    fn test_lfu_basic() {
        let mut cache = LfuCache::new(2);

        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.len(), 2);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lfu_scenario() {
        let mut cache = LfuCache::new(2);

        cache.put("a", 1);
        cache.put("a", 2); // update, freq 2
        assert_eq!(cache.get(&"a"), Some(&2)); // freq 3
        cache.put("b", 3); // freq 1
        assert_eq!(cache.min_frequency(), Some(1));
        cache.put("c", 4); // evicts b

        assert_eq!(cache.get(&"c"), Some(&4));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.frequency(&"a"), Some(3));
        assert_consistent(&cache);
    }

    #[test]
    fn test_lfu_full_tie_evicts_oldest() {
        let mut cache = LfuCache::new(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.get(&"a");
        cache.get(&"b");
        cache.get(&"c"); // all at 2, a oldest in the bucket
        cache.put("d", 4); // evicts a

        assert_eq!(entries(&cache), vec![("d", 1), ("b", 2), ("c", 2)]);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lfu_evicts_untouched_of_tie() {
        let mut cache = LfuCache::new(2);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.get(&"a");
        cache.get(&"b"); // both at 2, a older in the bucket
        cache.put("c", 3); // evicts a

        assert!(!cache.contains(&"a"));
        assert!(cache.contains(&"b"));
        assert!(cache.contains(&"c"));
        assert_eq!(cache.stats().evictions(), 1);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lfu_frequency_increments() {
        let mut cache = LfuCache::new(4);

        cache.put("a", 1);
        for expected in 2..=10 {
            cache.get(&"a");
            assert_eq!(cache.frequency(&"a"), Some(expected));
        }
        assert_eq!(cache.min_frequency(), Some(10));
        assert_consistent(&cache);
    }

    #[test]
    fn test_lfu_new_key_resets_cursor() {
        let mut cache = LfuCache::new(3);

        cache.put("a", 1);
        cache.get(&"a");
        cache.get(&"a");
        assert_eq!(cache.min_frequency(), Some(3));

        cache.put("b", 2);
        assert_eq!(cache.min_frequency(), Some(1));
        assert_eq!(cache.peek_lfu(), Some((&"b", &2)));
        assert_consistent(&cache);
    }

    #[test]
    fn test_lfu_peek_does_not_count() {
        let mut cache = LfuCache::new(2);

        cache.put("a", 1);
        assert_eq!(cache.peek(&"a"), Some(&1));
        assert!(cache.contains(&"a"));

        assert_eq!(cache.frequency(&"a"), Some(1));
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_lfu_remove_moves_cursor() {
        let mut cache = LfuCache::new(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.get(&"b");
        cache.get(&"b"); // a:1, b:3

        assert_eq!(cache.remove(&"a"), Some(1));
        assert_eq!(cache.min_frequency(), Some(3));
        assert_eq!(cache.remove(&"a"), None);
        assert_consistent(&cache);

        assert_eq!(cache.remove(&"b"), Some(2));
        assert_eq!(cache.min_frequency(), None);
        assert!(cache.buckets.is_empty());
    }

    #[test]
    fn test_lfu_pop_lfu() {
        let mut cache = LfuCache::new(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.get(&"a");

        assert_eq!(cache.pop_lfu(), Some(("b", 2)));
        assert_eq!(cache.min_frequency(), Some(2));
        assert_eq!(cache.pop_lfu(), Some(("a", 1)));
        assert_eq!(cache.pop_lfu(), None);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lfu_clear() {
        let mut cache = LfuCache::new(2);

        cache.put("a", 1);
        cache.get(&"a");
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.min_frequency(), None);

        cache.put("b", 2);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_consistent(&cache);
    }

    #[test]
    fn test_lfu_zero_capacity() {
        let mut cache = LfuCache::new(0);

        cache.put("a", 1);

        assert_eq!(cache.get(&"a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lfu_try_new() {
        assert!(matches!(
            LfuCache::<u8, u8>::try_new(-1),
            Err(Error::InvalidCapacity(-1))
        ));
        assert_eq!(LfuCache::<u8, u8>::try_new(0).unwrap().capacity(), 0);
        assert!(LfuCache::<u8, u8>::try_new(i64::MAX).is_ok());
    }

    #[test]
    #[should_panic(expected = "lfu cache index out of sync")]
    fn test_lfu_detached_node_panics() {
        let mut cache = LfuCache::new(2);
        cache.put("a", 1);

        // Unlink behind the index's back, leaving the bucket empty
        let id = cache.index[&"a"];
        let bucket = cache.buckets.get_mut(&1).unwrap();
        bucket.remove_node(&mut cache.arena, id).unwrap();

        cache.get(&"a");
    }

    #[test]
    fn test_lfu_bucket_sentinels_recycled() {
        let mut cache = LfuCache::new(1);

        cache.put("a", 1);
        for _ in 0..50 {
            cache.get(&"a");
        }

        // One live entry, one bucket: its sentinel is the only other slot
        assert_eq!(cache.buckets.len(), 1);
        assert_eq!(cache.arena.len(), 1);
        assert_eq!(cache.arena.slots_in_use(), 2);
    }
}
