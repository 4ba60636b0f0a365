//! Bounded clip history.

use crossclip_protocol::ClipItem;
use std::collections::VecDeque;

/// Clips accepted by the relay, oldest first.
///
/// The history never holds more than `capacity` items. Appending past
/// capacity evicts and returns the oldest item; the caller owns deleting
/// that item's blob.
#[derive(Debug)]
pub struct HistoryStore {
    items: VecDeque<ClipItem>,
    capacity: usize,
}

impl HistoryStore {
    /// Creates an empty history. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a clip, returning the evicted oldest clip if capacity was exceeded.
    pub fn append(&mut self, item: ClipItem) -> Option<ClipItem> {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }

    /// Returns the most recent clip.
    pub fn latest(&self) -> Option<&ClipItem> {
        self.items.back()
    }

    /// Returns the number of clips held.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no clip has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates clips oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ClipItem> {
        self.items.iter()
    }
}
