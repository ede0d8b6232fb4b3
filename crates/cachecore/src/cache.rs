//! Common interface for the eviction policies

use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::stats::CacheStats;

/// Fixed-capacity key-value cache
///
/// `get` and `put` are O(1) amortized for every implementation. A missing key
/// is reported as `None`, never as an error.
pub trait Cache<K, V> {
    /// Look up a key, counting the access towards the eviction policy
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Insert or overwrite a key, evicting one entry if the cache is full
    ///
    /// A cache with capacity 0 ignores every `put`.
    fn put(&mut self, key: K, value: V);

    /// Look up a key without touching recency or frequency
    fn peek(&self, key: &K) -> Option<&V>;

    /// True if the key is resident. Does not count as an access.
    fn contains(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// Drop a key and return its value
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Number of resident entries
    fn len(&self) -> usize;

    /// True if no entry is resident
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries, fixed at construction
    fn capacity(&self) -> usize;

    /// Drop every entry and reset statistics
    fn clear(&mut self);

    /// Hit/miss/eviction counters
    fn stats(&self) -> &CacheStats;

    /// Eviction policy of this cache
    fn policy(&self) -> Policy;

    /// Access count of a key, for policies that track one
    fn frequency(&self, _key: &K) -> Option<u64> {
        None
    }
}

impl<K, V, C> Cache<K, V> for Box<C>
where
    C: Cache<K, V> + ?Sized,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        (**self).get(key)
    }

    fn put(&mut self, key: K, value: V) {
        (**self).put(key, value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        (**self).peek(key)
    }

    fn contains(&self, key: &K) -> bool {
        (**self).contains(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        (**self).remove(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn stats(&self) -> &CacheStats {
        (**self).stats()
    }

    fn policy(&self) -> Policy {
        (**self).policy()
    }

    fn frequency(&self, key: &K) -> Option<u64> {
        (**self).frequency(key)
    }
}

/// Convert a signed capacity, rejecting negatives
///
/// Values beyond `usize::MAX` (only possible on 32-bit targets) saturate, as
/// no cache could hold that many entries anyway.
pub(crate) fn checked_capacity(capacity: i64) -> Result<usize> {
    if capacity < 0 {
        return Err(Error::InvalidCapacity(capacity));
    }
    Ok(usize::try_from(capacity).unwrap_or(usize::MAX))
}

/// Unwrap a list operation whose failure means the key index and the lists
/// disagree. There is no safe way to continue from that state.
#[track_caller]
pub(crate) fn in_sync<T>(result: Result<T>, policy: Policy) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("{} cache index out of sync with its list: {}", policy, e),
    }
}
