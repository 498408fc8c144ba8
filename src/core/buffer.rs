//! Fixed-capacity FIFO history of recent samples for one signal.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ordered, bounded history. Pushing past capacity evicts the oldest entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RollingBuffer<T> {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an item, returning the evicted oldest item if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// The last `n` items (fewer if unavailable), oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
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

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_keeps_capacity() {
        let mut buffer = RollingBuffer::new(3);
        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), None);
        assert_eq!(buffer.push(3), None);
        assert_eq!(buffer.push(4), Some(1));

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut buffer = RollingBuffer::new(50);
        for i in 0..25 {
            buffer.push(i);
        }

        let tail: Vec<i32> = buffer.recent(10).copied().collect();
        assert_eq!(tail, (15..25).collect::<Vec<_>>());

        let all: Vec<i32> = buffer.recent(100).copied().collect();
        assert_eq!(all.len(), 25);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut buffer = RollingBuffer::new(0);
        buffer.push("a");
        buffer.push("b");
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.front(), Some(&"b"));
    }
}
