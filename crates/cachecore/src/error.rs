//! Error types for cachecore

use std::fmt;

/// Result type alias for cachecore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache and list operations
///
/// A missing key is not an error: lookups return `Option` and `None` is the
/// normal "not found" outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Requested capacity was negative
    InvalidCapacity(i64),

    /// Head or node removal on an empty list
    EmptyList,

    /// Node handle is not resident in the list it was handed to
    NodeNotInList,

    /// Node handle is still linked into a list
    NodeStillLinked,

    /// Policy name not recognised
    UnknownPolicy(String),
}

impl Error {
    /// True for list contract failures, which mean the key index and the
    /// list have gone out of sync
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::EmptyList | Error::NodeNotInList | Error::NodeStillLinked
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(cap) => {
                write!(f, "Invalid capacity: {} (must be zero or greater)", cap)
            }
            Error::EmptyList => write!(f, "List is empty"),
            Error::NodeNotInList => write!(f, "Node does not belong to this list"),
            Error::NodeStillLinked => write!(f, "Node is still linked into a list"),
            Error::UnknownPolicy(name) => {
                write!(f, "Unknown eviction policy '{}' (expected lru or lfu)", name)
            }
        }
    }
}

impl std::error::Error for Error {}
