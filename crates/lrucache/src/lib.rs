//! # lrucache
//!
//! Fixed-capacity key-value cache with least-recently-used eviction.
//!
//! ## Architecture
//! - **Index**: AHash map from key to slot handle (O(1))
//! - **Recency list**: doubly-linked list threaded through a slot arena (O(1))
//! - **Eviction**: the back of the list goes first once the cache is full
//!
//! The cache is single-threaded. Wrap it in a mutex to share it.

#![warn(missing_docs)]

mod error;
mod lru;
mod stats;

pub use error::{Error, Result};
pub use lru::{Iter, LruCache};
pub use stats::CacheStats;
