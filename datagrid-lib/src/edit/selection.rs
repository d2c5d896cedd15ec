//! Row selection.

use std::collections::HashSet;
use std::hash::Hash;

/// Tracks selected items by their keys (checkbox style).
#[derive(Debug, Clone)]
pub struct Selection<K: Clone + Eq + Hash> {
    selected: HashSet<K>,
}

impl<K: Clone + Eq + Hash> Default for Selection<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> Selection<K> {
    pub fn new() -> Self {
        Self {
            selected: HashSet::new(),
        }
    }

    /// Toggle selection for a key. Returns true if the key is now selected.
    pub fn toggle(&mut self, key: K) -> bool {
        if self.selected.remove(&key) {
            false
        } else {
            self.selected.insert(key);
            true
        }
    }

    /// Replace the selection with `keys`.
    pub fn select_all(&mut self, keys: impl IntoIterator<Item = K>) {
        self.selected = keys.into_iter().collect();
    }

    /// Drop one key.
    pub fn deselect(&mut self, key: &K) {
        self.selected.remove(key);
    }

    /// Check if a key is selected.
    pub fn is_selected(&self, key: &K) -> bool {
        self.selected.contains(key)
    }

    /// Clear all selections.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
