//! Fixed-capacity recency cache used to memoize per-segment dictionary walks.
//!
//! Thin wrapper around `lru::LruCache` pinning down the semantics the match
//! caches rely on:
//! - `insert` refuses to overwrite an existing key (returns `false`),
//! - `find` refreshes recency and therefore takes `&mut self`,
//! - lookups accept any borrowed form of the key, so callers can probe a
//!   `String`-keyed cache with a transient `&str` without allocating.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

pub const DEFAULT_LRU_CAPACITY: usize = 80;

#[derive(Debug)]
pub struct LruMap<K: Hash + Eq, V> {
    inner: lru::LruCache<K, V>,
}

impl<K: Hash + Eq, V> LruMap<K, V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_LRU_CAPACITY).unwrap());
        Self {
            inner: lru::LruCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains(key)
    }

    /// Insert a fresh entry, evicting the least recently used one when full.
    /// Returns `false` without touching the cache if the key already exists.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.inner.contains(&key) {
            return false;
        }
        self.inner.push(key, value);
        true
    }

    /// Look up and refresh recency.
    pub fn find<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    pub fn erase<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.pop(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<K: Hash + Eq, V> Default for LruMap<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_LRU_CAPACITY)
    }
}
