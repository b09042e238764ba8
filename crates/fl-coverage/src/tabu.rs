//! Bounded recency buffer.
//!
//! Remembers the last `capacity` items pushed; pushing onto a full queue
//! evicts the oldest.  Rollouts use it as a soft signal only: a tabu node
//! is skipped when something else is available, never when it is the only
//! way forward.

use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct TabuQueue<T> {
    items:    VecDeque<T>,
    capacity: usize,
}

impl<T: PartialEq> TabuQueue<T> {
    /// An empty queue holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { items: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append `item`, evicting the oldest entry when full.  Duplicates are
    /// kept; each occupies its own slot.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    /// Most recently pushed item.
    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }
}
