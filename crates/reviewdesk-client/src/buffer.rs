//! Bounded notification list shown to the reviewer

use reviewdesk_domain::{DomainEvent, EventId};
use std::collections::{HashSet, VecDeque};

/// Most-recent-first ring buffer of received events
///
/// Delivery is at-least-once, so an event whose id was already seen is
/// ignored. The oldest entry is evicted once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct NotificationBuffer {
    capacity: usize,
    events: VecDeque<DomainEvent>,
    seen: HashSet<EventId>,
    seen_order: VecDeque<EventId>,
    unread: usize,
}

impl NotificationBuffer {
    /// Create an empty buffer holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
            seen: HashSet::new(),
            seen_order: VecDeque::new(),
            unread: 0,
        }
    }

    /// Add an event; returns `false` if it was a duplicate
    pub fn push(&mut self, event: DomainEvent) -> bool {
        if self.seen.contains(&event.id) {
            return false;
        }

        self.remember(event.id.clone());
        self.events.push_front(event);
        if self.events.len() > self.capacity {
            self.events.pop_back();
        }
        self.unread = (self.unread + 1).min(self.capacity);
        true
    }

    // Ids are remembered for a few buffer lengths past eviction
    fn remember(&mut self, id: EventId) {
        self.seen.insert(id.clone());
        self.seen_order.push_back(id);
        while self.seen_order.len() > self.capacity * 4 {
            if let Some(old) = self.seen_order.pop_front() {
                self.seen.remove(&old);
            }
        }
    }

    /// Events, newest first
    pub fn iter(&self) -> impl Iterator<Item = &DomainEvent> {
        self.events.iter()
    }

    /// Snapshot, newest first
    pub fn to_vec(&self) -> Vec<DomainEvent> {
        self.events.iter().cloned().collect()
    }

    /// Most recent event
    pub fn latest(&self) -> Option<&DomainEvent> {
        self.events.front()
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of buffered events
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events received since the last [`mark_all_read`](Self::mark_all_read)
    pub fn unread_count(&self) -> usize {
        self.unread
    }

    /// Reset the unread counter
    pub fn mark_all_read(&mut self) {
        self.unread = 0;
    }

    /// Drop every buffered event
    pub fn clear(&mut self) {
        self.events.clear();
        self.unread = 0;
    }
}

impl Default for NotificationBuffer {
    fn default() -> Self {
        Self::new(50)
    }
}
