//! # Content-Addressed Cache
//!
//! Memoization for render inputs and outputs, keyed by a BLAKE3 digest of
//! the resolved inputs (file fingerprint, URL, body digests, language, date).
//!
//! - Keys are built from tagged, length-prefixed parts so distinct inputs
//!   never collide by concatenation
//! - Entries live until explicitly invalidated or evicted by capacity
//! - Eviction is oldest-insertion-first, so behavior is deterministic

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// CACHE KEY
// =============================================================================

/// 32-byte BLAKE3 digest identifying a set of resolved inputs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Start a key for the given namespace.
    #[must_use]
    pub fn builder(namespace: &str) -> CacheKeyBuilder {
        CacheKeyBuilder::new(namespace)
    }

    /// Digest of arbitrary content (e.g. a fetched CSV body).
    #[must_use]
    pub fn of_content(content: &[u8]) -> Self {
        Self::builder("content").bytes(content).finish()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental builder for a [`CacheKey`].
pub struct CacheKeyBuilder {
    hasher: blake3::Hasher,
}

impl CacheKeyBuilder {
    fn new(namespace: &str) -> Self {
        let builder = Self {
            hasher: blake3::Hasher::new(),
        };
        builder.text(namespace)
    }

    /// Append a length-prefixed byte part.
    #[must_use]
    pub fn bytes(mut self, part: &[u8]) -> Self {
        self.hasher.update(&(part.len() as u64).to_le_bytes());
        self.hasher.update(part);
        self
    }

    #[must_use]
    pub fn text(self, part: &str) -> Self {
        self.bytes(part.as_bytes())
    }

    #[must_use]
    pub fn key(self, part: &CacheKey) -> Self {
        self.bytes(part.as_bytes())
    }

    #[must_use]
    pub fn finish(self) -> CacheKey {
        CacheKey(*self.hasher.finalize().as_bytes())
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Hit/miss counters and current size of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Map from [`CacheKey`] to shared immutable values.
#[derive(Debug)]
pub struct ContentCache<V> {
    entries: BTreeMap<CacheKey, Arc<V>>,
    order: VecDeque<CacheKey>,
    capacity: Option<usize>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> Default for ContentCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ContentCache<V> {
    /// Unbounded cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            order: VecDeque::new(),
            capacity: None,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new()
        }
    }

    /// Look up a key, counting the hit or miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<V>> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(Arc::clone(value))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a value, replacing any previous one under the same key.
    pub fn insert(&mut self, key: CacheKey, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if self.entries.insert(key, Arc::clone(&value)).is_none() {
            self.order.push_back(key);
        }
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                if self.entries.remove(&oldest).is_some() {
                    self.evictions += 1;
                }
            }
        }
        value
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Errors from `compute` are returned and nothing is stored.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: CacheKey,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        Ok(self.insert(key, value))
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Drop every entry. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.order.clear();
        dropped
    }

    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
