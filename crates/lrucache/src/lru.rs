//! LRU (Least Recently Used) cache implementation
//!
//! Entries live in a slot arena owned by the cache. The lookup index maps
//! keys to slot handles, and the recency list is threaded through the slots
//! with `prev`/`next` handles, so every operation is O(1) without raw
//! pointers. Freed slots are recycled through a free list.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::stats::CacheStats;

/// Stable identifier of a slot in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Handle(usize);

/// Node in the recency list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<Handle>,
    next: Option<Handle>,
}

/// LRU cache with fixed capacity
///
/// `get` and `set` both promote the touched entry to most-recently-used.
/// When the cache is full, inserting an absent key evicts the
/// least-recently-used entry first.
///
/// ```
/// use lrucache::LruCache;
///
/// let mut cache = LruCache::new(2).unwrap();
/// cache.set(1, "one");
/// cache.set(2, "two");
/// cache.get(&1);
/// cache.set(3, "three"); // evicts 2
///
/// assert_eq!(cache.get(&2), None);
/// assert_eq!(cache.get(&1), Some(&"one"));
/// ```
pub struct LruCache<K, V> {
    map: HashMap<K, Handle, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<Handle>,
    tail: Option<Handle>,
    free_list: Vec<Handle>,
    capacity: usize,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache holding at most `capacity` entries
    ///
    /// # Errors
    /// * `Error::ZeroCapacity` - `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }

        debug!(capacity, "created LRU cache");

        Ok(Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
            stats: CacheStats::new(),
        })
    }

    /// Get a value and mark its entry as most recently used
    ///
    /// A miss leaves the entries untouched and only bumps the miss counter.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&handle) = self.map.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.stats.record_hit();
        self.move_to_front(handle);
        self.nodes[handle.0].as_ref().map(|node| &node.value)
    }

    /// Insert or overwrite a key-value pair
    ///
    /// Overwriting never evicts. Inserting an absent key into a full cache
    /// evicts the least-recently-used entry first.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(&handle) = self.map.get(&key) {
            if let Some(node) = &mut self.nodes[handle.0] {
                node.value = value;
            }
            self.stats.record_update();
            self.move_to_front(handle);
            return;
        }

        if self.map.len() >= self.capacity {
            self.evict_back();
        }

        let handle = self.alloc_node();
        self.nodes[handle.0] = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.push_front(handle);
        self.map.insert(key, handle);
        self.stats.record_insert();

        debug_assert!(self.map.len() <= self.capacity);
        debug_assert_eq!(self.map.len(), self.nodes.len() - self.free_list.len());
    }

    /// Get a value without changing its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &handle = self.map.get(key)?;
        self.nodes[handle.0].as_ref().map(|node| &node.value)
    }

    /// Check whether a key is cached, without changing its recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    fn move_to_front(&mut self, handle: Handle) {
        if self.head == Some(handle) {
            return;
        }

        self.unlink(handle);
        self.push_front(handle);
    }

    fn push_front(&mut self, handle: Handle) {
        let old_head = self.head;

        if let Some(node) = &mut self.nodes[handle.0] {
            node.prev = None;
            node.next = old_head;
        }

        match old_head {
            Some(head) => {
                if let Some(head_node) = &mut self.nodes[head.0] {
                    head_node.prev = Some(handle);
                }
            }
            None => self.tail = Some(handle),
        }

        self.head = Some(handle);
    }

    fn unlink(&mut self, handle: Handle) {
        let (prev, next) = match &mut self.nodes[handle.0] {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(prev) => {
                if let Some(prev_node) = &mut self.nodes[prev.0] {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next) => {
                if let Some(next_node) = &mut self.nodes[next.0] {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn evict_back(&mut self) {
        let Some(tail) = self.tail else {
            return;
        };

        self.unlink(tail);
        if let Some(node) = self.nodes[tail.0].take() {
            self.map.remove(&node.key);
            self.free_list.push(tail);
            self.stats.record_eviction();
            trace!(slot = tail.0, len = self.map.len(), "evicted least recently used entry");
        }
    }

    fn alloc_node(&mut self) -> Handle {
        if let Some(handle) = self.free_list.pop() {
            handle
        } else {
            self.nodes.push(None);
            Handle(self.nodes.len() - 1)
        }
    }
}

impl<K, V> LruCache<K, V> {
    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries, fixed at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Key of the most recently used entry
    pub fn mru_key(&self) -> Option<&K> {
        self.key_at(self.head)
    }

    /// Key of the entry that the next overflowing insert would evict
    pub fn lru_key(&self) -> Option<&K> {
        self.key_at(self.tail)
    }

    /// Iterate entries from most to least recently used
    ///
    /// Iteration does not change recency.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
            remaining: self.map.len(),
        }
    }

    /// Usage counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Zero the usage counters, leaving entries untouched
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn key_at(&self, handle: Option<Handle>) -> Option<&K> {
        let handle = handle?;
        self.nodes[handle.0].as_ref().map(|node| &node.key)
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a LruCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over cache entries in recency order, created by [`LruCache::iter`]
pub struct Iter<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    cursor: Option<Handle>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes[self.cursor?.0].as_ref()?;
        self.cursor = node.next;
        debug_assert!(self.remaining > 0, "recency list longer than index");
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

#[cfg(test)]
impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    /// Walk the whole structure and panic on any broken link or index entry
    fn validate(&self) {
        let mut count = 0;
        let mut prev: Option<Handle> = None;
        let mut cursor = self.head;

        while let Some(handle) = cursor {
            assert!(count < self.nodes.len(), "cycle in recency list");
            let node = self.nodes[handle.0]
                .as_ref()
                .expect("linked slot must be occupied");
            assert_eq!(node.prev, prev, "broken back link at slot {}", handle.0);
            assert_eq!(
                self.map.get(&node.key),
                Some(&handle),
                "index disagrees for {:?}",
                node.key
            );
            prev = Some(handle);
            cursor = node.next;
            count += 1;
        }

        assert_eq!(self.tail, prev, "tail is not the end of the list");
        assert_eq!(count, self.map.len());
        assert!(count <= self.capacity);
        assert_eq!(self.head.is_none(), self.tail.is_none());
        for handle in &self.free_list {
            assert!(self.nodes[handle.0].is_none(), "free slot still occupied");
        }
        assert_eq!(self.nodes.len(), count + self.free_list.len());
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Operation {
        Get(u8),
        Set(u8, i32),
    }

    fn operation_strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            (0u8..32).prop_map(Operation::Get),
            (0u8..32, any::<i32>()).prop_map(|(k, v)| Operation::Set(k, v)),
        ]
    }

    /// Reference model: entries ordered most to least recently used
    fn model_apply(model: &mut Vec<(u8, i32)>, capacity: usize, op: &Operation) -> Option<i32> {
        match *op {
            Operation::Get(k) => {
                let pos = model.iter().position(|(mk, _)| *mk == k)?;
                let entry = model.remove(pos);
                model.insert(0, entry);
                Some(entry.1)
            }
            Operation::Set(k, v) => {
                if let Some(pos) = model.iter().position(|(mk, _)| *mk == k) {
                    model.remove(pos);
                } else if model.len() == capacity {
                    model.pop();
                }
                model.insert(0, (k, v));
                None
            }
        }
    }

    proptest! {
        /// len() never exceeds capacity.
        #[test]
        fn prop_len_within_capacity(
            capacity in 1usize..16,
            ops in prop::collection::vec((0u16..500, any::<u32>()), 0..200)
        ) {
            let mut cache = LruCache::new(capacity).unwrap();
            for (key, value) in ops {
                cache.set(key, value);
                prop_assert!(cache.len() <= cache.capacity());
            }
        }

        /// Arbitrary operation sequences match the reference model and keep
        /// the index and recency list consistent.
        #[test]
        fn prop_matches_reference_model(
            capacity in 1usize..12,
            ops in prop::collection::vec(operation_strategy(), 0..300)
        ) {
            let mut cache = LruCache::new(capacity).unwrap();
            let mut model = Vec::new();

            for op in &ops {
                let expected = model_apply(&mut model, capacity, op);
                match *op {
                    Operation::Get(k) => {
                        prop_assert_eq!(cache.get(&k).copied(), expected);
                    }
                    Operation::Set(k, v) => cache.set(k, v),
                }
                cache.validate();

                let actual: Vec<_> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(&actual, &model);
            }
        }

        /// Setting a key and reading it back returns the value at any fill level.
        #[test]
        fn prop_set_then_get(
            capacity in 1usize..8,
            prefill in prop::collection::vec((0u8..64, any::<i64>()), 0..40),
            key in 0u8..64,
            value in any::<i64>()
        ) {
            let mut cache = LruCache::new(capacity).unwrap();
            for (k, v) in prefill {
                cache.set(k, v);
            }

            cache.set(key, value);
            prop_assert_eq!(cache.get(&key), Some(&value));
        }

        /// Overwriting a cached key changes neither len() nor the eviction count.
        #[test]
        fn prop_update_is_not_insert(
            capacity in 1usize..8,
            prefill in prop::collection::vec(0u8..32, 1..40),
            value in any::<u16>()
        ) {
            let mut cache = LruCache::new(capacity).unwrap();
            for k in &prefill {
                cache.set(*k, 0u16);
            }

            let key = *cache.lru_key().unwrap();
            let len = cache.len();
            let evictions = cache.stats().evictions();

            cache.set(key, value);
            prop_assert_eq!(cache.len(), len);
            prop_assert_eq!(cache.stats().evictions(), evictions);
            prop_assert_eq!(cache.mru_key(), Some(&key));
        }

        /// The next overflow evicts exactly the least recently touched key.
        #[test]
        fn prop_overflow_evicts_lru(
            capacity in 1usize..8,
            ops in prop::collection::vec(operation_strategy(), 0..100)
        ) {
            let mut cache = LruCache::new(capacity).unwrap();
            for op in ops {
                match op {
                    Operation::Get(k) => { cache.get(&k); }
                    Operation::Set(k, v) => cache.set(k, v),
                }
            }

            // Fill up with fresh keys so the next insert must evict
            let mut fresh = 100u8;
            while cache.len() < capacity {
                cache.set(fresh, 0);
                fresh += 1;
            }

            let victim = *cache.lru_key().unwrap();
            cache.set(200, 0);
            prop_assert!(!cache.contains(&victim));
            prop_assert_eq!(cache.len(), capacity);
        }
    }
}
