use std::collections::BTreeMap;

use crate::listy::{Listy, ListyElement};

/// Identity of one entry of the multiset. Equal values are told apart by
/// their arrival number, so every entry has a distinct position and equal
/// values sort in arrival order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key<T> {
    pub value: T,
    pub seq: u64,
}

impl<T> Key<T> {
    pub fn new(value: T, seq: u64) -> Key<T> {
        Key { value, seq }
    }
}

pub type Position<T> = ListyElement<Key<T>>;

/// A sorted multiset with stable positions.
///
/// Entries live in a `Listy` kept in ascending key order, which gives O(1)
/// stepping to either neighbour from a held `Position`. A `BTreeMap` from
/// key to position finds where a new entry belongs in O(log n).
#[derive(Clone, Debug)]
pub struct SortedMultiset<T> {
    order: Listy<Key<T>>,
    index: BTreeMap<Key<T>, Position<T>>,
}

impl<T: Ord + Copy> SortedMultiset<T> {
    pub fn new() -> SortedMultiset<T> {
        SortedMultiset::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> SortedMultiset<T> {
        SortedMultiset {
            order: Listy::with_capacity(capacity),
            index: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insert an entry; `key.seq` must not already be present with the same value.
    pub fn insert(&mut self, key: Key<T>) -> Position<T> {
        let pos = match self.index.range(..key).next_back() {
            Some((_, before)) => self.order.insert_after(before, key),
            None => self.order.push_front(key),
        };
        let clash = self.index.insert(key, pos);
        debug_assert!(clash.is_none(), "duplicate multiset key");
        pos
    }

    pub fn remove_key(&mut self, key: &Key<T>) -> Option<T> {
        let pos = self.index.remove(key)?;
        self.order.remove(&pos).map(|k| k.value)
    }

    pub fn key(&self, pos: &Position<T>) -> Key<T> {
        self.order[*pos]
    }

    pub fn value(&self, pos: &Position<T>) -> T {
        self.order[*pos].value
    }

    pub fn successor(&self, pos: &Position<T>) -> Option<Position<T>> {
        self.order.next(pos)
    }

    pub fn predecessor(&self, pos: &Position<T>) -> Option<Position<T>> {
        self.order.prev(pos)
    }

    /// Number of entries strictly before `pos`. Walks the index, so O(n).
    pub fn rank(&self, pos: &Position<T>) -> Option<usize> {
        let key = self.order.get(pos)?;
        Some(self.index.range(..*key).count())
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.order.iter().map(|k| k.value)
    }
}

impl<T: Ord + Copy> Default for SortedMultiset<T> {
    fn default() -> Self {
        Self::new()
    }
}
