use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use logscope_types::LogEvent;

/// Default history bound for the dashboard
pub const DEFAULT_CAPACITY: usize = 50;

/// Thread-safe bounded buffer holding the most recent log events,
/// newest-first.
///
/// Overflow evicts the oldest entry per insert (strict FIFO), which bounds
/// memory regardless of stream rate at the cost of losing older history.
/// Ties between equal timestamps are broken by arrival order; the buffer
/// never re-sorts.
#[derive(Clone)]
pub struct EventBuffer {
    /// Internal storage, index 0 = newest
    events: Arc<RwLock<VecDeque<LogEvent>>>,

    /// Maximum capacity
    capacity: usize,

    /// Bumped on every mutation, for cheap change detection by consumers
    revision: Arc<AtomicU64>,
}

impl EventBuffer {
    /// Create a new event buffer with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Insert a new event at the front, evicting the oldest if at capacity.
    ///
    /// The buffer trusts upstream ID uniqueness and does not deduplicate.
    pub fn insert(&self, event: LogEvent) {
        let mut events = self.events.write();
        events.push_front(event);
        while events.len() > self.capacity {
            events.pop_back();
        }
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Replace the entire contents from a bulk history fetch (newest-first).
    ///
    /// Used once at session start. A live event inserted while the bulk
    /// fetch was in flight is dropped by the replacement; this mirrors the
    /// service's replace-on-load semantics rather than merging by ID.
    pub fn initialize_from<I>(&self, history: I)
    where
        I: IntoIterator<Item = LogEvent>,
    {
        let mut events = self.events.write();
        events.clear();
        events.extend(history.into_iter().take(self.capacity));
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Get a read-only view of all events, newest-first
    pub fn snapshot(&self) -> Vec<LogEvent> {
        self.events.read().iter().cloned().collect()
    }

    /// Total event count
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Maximum capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current revision counter
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Clear all events
    pub fn clear(&self) {
        self.events.write().clear();
        self.revision.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use logscope_types::LogLevel;

    fn event(id: u64) -> LogEvent {
        LogEvent {
            id,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            level: LogLevel::Info,
            service: "auth".to_string(),
            message: format!("event {id}"),
        }
    }

    #[test]
    fn test_insert_newest_first() {
        let buffer = EventBuffer::new(10);
        buffer.insert(event(1));
        buffer.insert(event(2));
        buffer.insert(event(3));

        let ids: Vec<u64> = buffer.snapshot().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_capacity_bound_holds() {
        let buffer = EventBuffer::new(10);
        for id in 0..100 {
            buffer.insert(event(id));
            assert!(buffer.len() <= 10);
        }
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_fifo_eviction_drops_exactly_the_oldest() {
        let buffer = EventBuffer::new(5);
        for id in 1..=7 {
            buffer.insert(event(id));
        }

        // 1 and 2 were the oldest arrivals and are gone
        let ids: Vec<u64> = buffer.snapshot().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn test_fifty_first_event() {
        let buffer = EventBuffer::new(DEFAULT_CAPACITY);
        for id in 0..50 {
            buffer.insert(event(id));
        }
        let before = buffer.snapshot();
        assert_eq!(before.len(), 50);
        assert_eq!(before[49].id, 0);

        buffer.insert(event(50));

        let after = buffer.snapshot();
        assert_eq!(after.len(), 50);
        assert_eq!(after[0].id, 50);
        assert_eq!(after[49].id, 1);
        assert!(!after.iter().any(|e| e.id == 0));
    }

    #[test]
    fn test_initialize_from_replaces_contents() {
        let buffer = EventBuffer::new(10);
        buffer.insert(event(99));

        buffer.initialize_from(vec![event(3), event(2), event(1)]);

        let ids: Vec<u64> = buffer.snapshot().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        // Live pushes then layer on top
        buffer.insert(event(4));
        assert_eq!(buffer.snapshot()[0].id, 4);
    }

    #[test]
    fn test_initialize_from_clamps_to_capacity() {
        let buffer = EventBuffer::new(3);
        buffer.initialize_from((0..10).map(event));
        assert_eq!(buffer.len(), 3);
        // The newest (front of the incoming history) are kept
        let ids: Vec<u64> = buffer.snapshot().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let buffer = EventBuffer::new(5);
        let r0 = buffer.revision();
        buffer.insert(event(1));
        let r1 = buffer.revision();
        assert!(r1 > r0);
        buffer.clear();
        assert!(buffer.revision() > r1);
    }
}
