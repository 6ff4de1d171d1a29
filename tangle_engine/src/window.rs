/// Eviction window.
///
/// Arrival-ordered queue of `(key, arrival)` entries. Entries go stale when
/// their vertex is removed out of order (cascade) or re-admitted under a
/// newer arrival number; stale entries are skipped when popped.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::DEFAULT_CAPACITY;
use crate::keys::VertexKey;

#[derive(Debug)]
pub struct EvictionWindow {
    capacity: usize,
    queue: VecDeque<(VertexKey, u64)>,
    next_arrival: u64,
    /// Capacity was lowered below the stored size and no admission has
    /// enforced it yet.
    shrink_pending: bool,
}

impl Default for EvictionWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EvictionWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: VecDeque::new(),
            next_arrival: 0,
            shrink_pending: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity. Takes effect at the next admission.
    pub fn set_capacity(&mut self, capacity: usize, stored: usize) {
        debug!(from = self.capacity, to = capacity, stored, "window capacity changed");
        self.capacity = capacity;
        self.shrink_pending = stored > capacity;
    }

    pub fn shrink_pending(&self) -> bool {
        self.shrink_pending
    }

    /// Record an arrival and return its sequence number.
    pub fn register(&mut self, key: &VertexKey) -> u64 {
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        self.queue.push_back((key.clone(), arrival));
        arrival
    }

    pub fn over_capacity(&self, stored: usize) -> bool {
        stored > self.capacity
    }

    /// Oldest queued entry, stale or not.
    pub fn pop_oldest(&mut self) -> Option<(VertexKey, u64)> {
        self.queue.pop_front()
    }

    /// Called once the store is back within capacity.
    pub fn mark_enforced(&mut self) {
        self.shrink_pending = false;
    }

    /// Queued entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = (&VertexKey, u64)> {
        self.queue.iter().map(|(k, a)| (k, *a))
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Forget all entries. Arrival numbers keep increasing.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.shrink_pending = false;
    }
}
