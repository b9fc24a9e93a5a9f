//! Bounded key/value tier with FIFO eviction.

use std::collections::{HashMap, VecDeque};

/// A map from key to value holding at most `capacity` entries.
///
/// `order` lists every key in `entries` exactly once, oldest first. Both are
/// private and only change together, so eviction is a `pop_front`.
#[derive(Debug)]
pub(crate) struct Tier<V> {
    entries: HashMap<u64, V>,
    order: VecDeque<u64>,
    capacity: usize,
}

impl<V> Tier<V> {
    /// Create an empty tier pre-sized for `capacity` entries.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn get(&self, key: u64) -> Option<&V> {
        self.entries.get(&key)
    }

    /// Insert or overwrite `key`.
    ///
    /// Overwrites keep the key's queue position. A new key arriving at a full
    /// tier evicts the oldest key first; the evicted key is returned.
    pub(crate) fn insert(&mut self, key: u64, value: V) -> Option<u64> {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return None;
        }
        if self.capacity == 0 {
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        self.entries.insert(key, value);
        self.order.push_back(key);
        evicted
    }

    /// Remove every entry, returning how many were dropped.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.order.clear();
        dropped
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first.
    pub(crate) fn iter(&self) -> impl ExactSizeIterator<Item = (u64, &V)> + '_ {
        self.order.iter().map(move |key| (*key, &self.entries[key]))
    }

    fn evict_oldest(&mut self) -> Option<u64> {
        let key = self.order.pop_front()?;
        self.entries.remove(&key);
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut tier = Tier::with_capacity(4);
        assert!(tier.insert(1, "a").is_none());
        assert!(tier.insert(2, "b").is_none());

        assert_eq!(tier.get(1), Some(&"a"));
        assert_eq!(tier.get(2), Some(&"b"));
        assert_eq!(tier.get(3), None);
        assert_eq!(tier.len(), 2);
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut tier = Tier::with_capacity(3);
        tier.insert(1, 10);
        tier.insert(2, 20);
        tier.insert(3, 30);

        assert_eq!(tier.insert(4, 40), Some(1));
        assert_eq!(tier.len(), 3);
        assert!(tier.get(1).is_none());
        assert_eq!(tier.get(4), Some(&40));

        assert_eq!(tier.insert(5, 50), Some(2));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut tier = Tier::with_capacity(2);
        tier.insert(1, 10);
        tier.insert(2, 20);

        // Overwrite does not evict and does not refresh key 1.
        assert!(tier.insert(1, 11).is_none());
        assert_eq!(tier.get(1), Some(&11));

        assert_eq!(tier.insert(3, 30), Some(1));
        assert_eq!(tier.get(2), Some(&20));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let mut tier = Tier::with_capacity(1);
        tier.insert(7, 1);
        assert!(tier.insert(7, 2).is_none());
        assert_eq!(tier.len(), 1);
        assert_eq!(tier.get(7), Some(&2));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut tier = Tier::with_capacity(0);
        assert!(tier.insert(1, 1).is_none());
        assert_eq!(tier.len(), 0);
    }

    #[test]
    fn test_clear() {
        let mut tier = Tier::with_capacity(4);
        tier.insert(1, ());
        tier.insert(2, ());

        assert_eq!(tier.clear(), 2);
        assert_eq!(tier.len(), 0);
        assert_eq!(tier.iter().len(), 0);

        // Queue is reset along with the map.
        tier.insert(3, ());
        assert_eq!(tier.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_iter_oldest_first() {
        let mut tier = Tier::with_capacity(3);
        for key in [5, 3, 9, 1] {
            tier.insert(key, key * 10);
        }

        let items: Vec<_> = tier.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(items, vec![(3, 30), (9, 90), (1, 10)]);
        assert_eq!(tier.capacity(), 3);
    }
}
