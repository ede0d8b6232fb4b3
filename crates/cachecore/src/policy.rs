//! Eviction policy selection

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::cache::{checked_capacity, Cache};
use crate::error::{Error, Result};
use crate::lfu::LfuCache;
use crate::lru::LruCache;

/// Eviction discipline of a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Policy {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used, least recently used among ties
    Lfu,
}

impl Policy {
    /// Lower-case policy name
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Lru => "lru",
            Policy::Lfu => "lfu",
        }
    }

    /// Build an empty cache of this policy
    pub fn build<K, V>(self, capacity: usize) -> Box<dyn Cache<K, V> + Send>
    where
        K: Hash + Eq + Clone + Send + 'static,
        V: Send + 'static,
    {
        match self {
            Policy::Lru => Box::new(LruCache::new(capacity)),
            Policy::Lfu => Box::new(LfuCache::new(capacity)),
        }
    }

    /// Build an empty cache from a signed capacity
    ///
    /// Fails with [`Error::InvalidCapacity`] if `capacity` is negative.
    pub fn try_build<K, V>(self, capacity: i64) -> Result<Box<dyn Cache<K, V> + Send>>
    where
        K: Hash + Eq + Clone + Send + 'static,
        V: Send + 'static,
    {
        checked_capacity(capacity).map(|capacity| self.build(capacity))
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(Policy::Lru),
            "lfu" => Ok(Policy::Lfu),
            _ => Err(Error::UnknownPolicy(s.to_string())),
        }
    }
}
