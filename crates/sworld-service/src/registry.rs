//! Concurrent in-memory registries.

use std::fmt;
use std::hash::Hash;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::{DashMap, DashSet};

/// A shared map from IDs to live objects.
///
/// Clones share the same map. Lookups hand out `Arc` clones and never
/// leak a map guard, so callers can hold results across awaits and the
/// portal close callback can remove entries from any context.
pub struct Registry<K, V> {
    entries: Arc<DashMap<K, Arc<V>>>,
}

impl<K, V> Clone for Registry<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K: Eq + Hash, V> fmt::Debug for Registry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<K: Eq + Hash, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> Registry<K, V> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&self, key: K, value: Arc<V>) {
        self.entries.insert(key, value);
    }

    /// Look up an entry.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove an entry, returning it.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    /// Whether an entry exists.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the entries matching `keep`.
    pub fn filter(&self, keep: impl Fn(&V) -> bool) -> Vec<Arc<V>> {
        self.entries
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Snapshot of every entry.
    pub fn values(&self) -> Vec<Arc<V>> {
        self.filter(|_| true)
    }
}

/// A bounded memory of removed keys.
///
/// Holds at most `capacity` keys; recording one more forgets the oldest.
/// Clones share the same memory.
pub struct Tombstones<K> {
    keys: Arc<DashSet<K>>,
    order: Arc<Mutex<VecDeque<K>>>,
    capacity: usize,
}

impl<K> Clone for Tombstones<K> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            order: Arc::clone(&self.order),
            capacity: self.capacity,
        }
    }
}

impl<K: Eq + Hash> fmt::Debug for Tombstones<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tombstones")
            .field("len", &self.keys.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<K: Eq + Hash + Clone> Tombstones<K> {
    /// An empty memory for up to `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: Arc::new(DashSet::new()),
            order: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    /// Remember `key`, forgetting the oldest keys beyond capacity.
    pub fn record(&self, key: K) {
        let mut order = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.keys.insert(key.clone()) {
            return;
        }
        order.push_back(key);
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
    }

    /// Whether `key` is remembered.
    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    /// Number of remembered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let registry: Registry<u32, String> = Registry::new();
        let other = registry.clone();
        registry.insert(1, Arc::new("one".to_owned()));
        registry.insert(2, Arc::new("two".to_owned()));

        assert_eq!(other.get(&1).unwrap().as_str(), "one");
        assert_eq!(other.len(), 2);
        assert_eq!(other.filter(|value| value.starts_with('t')).len(), 1);

        other.remove(&1);
        assert!(!registry.contains(&1));
        assert_eq!(registry.values().len(), 1);
        assert_eq!(format!("{registry:?}"), "Registry { len: 1 }");
    }

    #[test]
    fn tombstones_forget_the_oldest_beyond_capacity() {
        let tombstones = Tombstones::new(3);
        let shared = tombstones.clone();
        for key in 0..5_u32 {
            tombstones.record(key);
        }
        tombstones.record(4);

        assert_eq!(shared.len(), 3);
        assert!(!shared.contains(&0));
        assert!(!shared.contains(&1));
        assert!((2..5).all(|key| shared.contains(&key)));
    }
}
