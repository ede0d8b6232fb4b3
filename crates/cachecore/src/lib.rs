//! # cachecore
//!
//! Fixed-capacity key-value caches with O(1) `get`/`put`.
//!
//! ## Architecture
//! - **IntrusiveList**: sentinel-anchored circular list over a node arena,
//!   linked by integer handles
//! - **LruCache**: one list ordered least to most recently used, plus an
//!   AHash key index
//! - **LfuCache**: one list per access count, a key index and a
//!   lowest-frequency cursor; ties evict the least recently touched entry
//! - **SharedCache**: single-lock wrapper for use from several threads
//!
//! The caches themselves are single-threaded and never block.

#![warn(missing_docs)]

mod cache;
mod error;
mod lfu;
pub mod list;
mod lru;
mod policy;
mod shared;
mod stats;

pub use cache::Cache;
pub use error::{Error, Result};
pub use lfu::LfuCache;
pub use list::{IntrusiveList, NodeArena, NodeId};
pub use lru::LruCache;
pub use policy::Policy;
pub use shared::SharedCache;
pub use stats::{CacheStats, StatsSnapshot};
