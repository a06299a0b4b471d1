//! Error types for lrucache

use std::fmt;

/// Result type alias for lrucache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when building a cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A cache must hold at least one entry
    ZeroCapacity,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroCapacity => write!(f, "Capacity must be greater than 0"),
        }
    }
}

impl std::error::Error for Error {}
