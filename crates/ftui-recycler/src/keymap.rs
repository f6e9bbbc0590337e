//! Bidirectional map between stable item keys and volatile indices.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{RecycleError, Result};

/// Keys in list order plus a reverse lookup.
///
/// `keys[i]` is the key at index `i`, and `by_key[keys[i]] == i` for every
/// `i`. Both sides change together inside [`insert_keys`](Self::insert_keys)
/// and [`remove_keys`](Self::remove_keys).
#[derive(Debug, Clone)]
pub struct IndexKeyMap<K> {
    keys: Vec<K>,
    by_key: FxHashMap<K, usize>,
}

impl<K> Default for IndexKeyMap<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            by_key: FxHashMap::default(),
        }
    }
}

impl<K: Clone + Eq + Hash> IndexKeyMap<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Current index of `key`.
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// Key at `index`.
    pub fn key_of(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.by_key.contains_key(key)
    }

    /// All keys in list order.
    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Validate an insertion without applying it.
    ///
    /// Fails when `at > len` or when a new key collides with an existing key
    /// or with another new key.
    pub fn check_insert(&self, at: usize, new_keys: &[K]) -> Result<()> {
        if at > self.keys.len() {
            return Err(RecycleError::IndexOutOfRange {
                index: at,
                len: self.keys.len(),
            });
        }
        let mut seen = FxHashSet::default();
        for (offset, key) in new_keys.iter().enumerate() {
            if self.by_key.contains_key(key) || !seen.insert(key) {
                return Err(RecycleError::DuplicateKey { offset });
            }
        }
        Ok(())
    }

    /// Insert `new_keys` before index `at`, renumbering everything behind.
    pub fn insert_keys(&mut self, at: usize, new_keys: Vec<K>) -> Result<()> {
        self.check_insert(at, &new_keys)?;
        let count = new_keys.len();
        if count == 0 {
            return Ok(());
        }
        self.keys.splice(at..at, new_keys);
        self.renumber_from(at);
        self.debug_assert_consistent();
        Ok(())
    }

    /// Validate a removal without applying it.
    pub fn check_remove(&self, at: usize, count: usize) -> Result<()> {
        let len = self.keys.len();
        if count == 0 && at <= len {
            return Ok(());
        }
        if at >= len {
            return Err(RecycleError::IndexOutOfRange { index: at, len });
        }
        match at.checked_add(count) {
            Some(end) if end <= len => Ok(()),
            _ => Err(RecycleError::IndexOutOfRange {
                index: at.saturating_add(count).saturating_sub(1),
                len,
            }),
        }
    }

    /// Remove `count` keys starting at `at`; returns them in order.
    pub fn remove_keys(&mut self, at: usize, count: usize) -> Result<Vec<K>> {
        self.check_remove(at, count)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let removed: Vec<K> = self.keys.drain(at..at + count).collect();
        for key in &removed {
            self.by_key.remove(key);
        }
        self.renumber_from(at);
        self.debug_assert_consistent();
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.by_key.clear();
    }

    fn renumber_from(&mut self, from: usize) {
        for (index, key) in self.keys.iter().enumerate().skip(from) {
            self.by_key.insert(key.clone(), index);
        }
    }

    fn debug_assert_consistent(&self) {
        debug_assert_eq!(self.keys.len(), self.by_key.len());
        #[cfg(debug_assertions)]
        for (index, key) in self.keys.iter().enumerate() {
            debug_assert_eq!(self.by_key.get(key), Some(&index));
        }
    }
}
