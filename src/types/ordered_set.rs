//! Insertion-ordered, deduplicating sequence.

use std::hash::Hash;

use indexmap::IndexSet;
use indexmap::set::{Iter, Slice};

/// A sequence that holds each value at most once, in first-insertion order.
#[derive(Debug, Clone)]
pub struct OrderedSet<T: Eq + Hash + Clone> {
    items: IndexSet<T>,
}

impl<T: Eq + Hash + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        OrderedSet {
            items: IndexSet::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every item not already present, returning the ones actually added.
    pub fn push<I: IntoIterator<Item = T>>(&mut self, items: I) -> Vec<T> {
        let mut added = Vec::new();
        for item in items {
            if !self.items.contains(&item) {
                self.items.insert(item.clone());
                added.push(item);
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// An owned copy of the items.
    pub fn copy(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    /// A read-only view of the items, without copying.
    pub fn direct(&self) -> &Slice<T> {
        self.items.as_slice()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        set.push(iter);
        set
    }
}

impl<'a, T: Eq + Hash + Clone> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
