//! Fire-time ordered schedule queue
//!
//! Entries are kept sorted by non-decreasing fire time. Entries with equal fire
//! times leave in insertion order: a new entry is placed immediately before the
//! first entry whose fire time is strictly greater.

use std::collections::VecDeque;
use std::fmt;

/// Identity of one queued entry, unique within its queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry#{}", self.0)
    }
}

/// A queued payload together with its fire time
#[derive(Debug, Clone, PartialEq)]
pub struct Queued<T> {
    /// Queue-assigned identity
    pub id: EntryId,
    /// Time at which the entry becomes due, in seconds
    pub fire_at: f64,
    /// Caller data
    pub payload: T,
}

/// Priority queue ordered by fire time, FIFO among ties
#[derive(Debug, Clone)]
pub struct ScheduleQueue<T> {
    entries: VecDeque<Queued<T>>,
    next_id: u64,
}

impl<T> Default for ScheduleQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScheduleQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are pending
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `payload` to fire at `fire_at`, after every entry due at or before it
    pub fn insert(&mut self, fire_at: f64, payload: T) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        let position = self.entries.partition_point(|queued| queued.fire_at <= fire_at);
        self.entries.insert(
            position,
            Queued {
                id,
                fire_at,
                payload,
            },
        );
        id
    }

    /// Earliest entry, without removing it
    pub fn peek(&self) -> Option<&Queued<T>> {
        self.entries.front()
    }

    /// Remove and return the earliest entry
    pub fn pop_first(&mut self) -> Option<Queued<T>> {
        self.entries.pop_front()
    }

    /// Remove and return the earliest entry if it is due at or before `deadline`
    pub fn pop_due(&mut self, deadline: f64) -> Option<Queued<T>> {
        match self.entries.front() {
            Some(first) if first.fire_at <= deadline => self.entries.pop_front(),
            _ => None,
        }
    }

    /// Whether the earliest entry is due at or before `deadline`
    pub fn has_due(&self, deadline: f64) -> bool {
        self.entries
            .front()
            .is_some_and(|first| first.fire_at <= deadline)
    }

    /// Remove the entry with the given identity
    pub fn remove(&mut self, id: EntryId) -> Option<Queued<T>> {
        let position = self.entries.iter().position(|queued| queued.id == id)?;
        self.entries.remove(position)
    }

    /// Remove the earliest entry whose payload matches `predicate`
    pub fn remove_first_where<P>(&mut self, mut predicate: P) -> Option<Queued<T>>
    where
        P: FnMut(&T) -> bool,
    {
        let position = self
            .entries
            .iter()
            .position(|queued| predicate(&queued.payload))?;
        self.entries.remove(position)
    }

    /// Entries in fire order
    pub fn iter(&self) -> impl Iterator<Item = &Queued<T>> + '_ {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fire_times<T>(queue: &ScheduleQueue<T>) -> Vec<f64> {
        queue.iter().map(|queued| queued.fire_at).collect()
    }

    #[test]
    fn test_insert_keeps_fire_order() {
        let mut queue = ScheduleQueue::new();
        queue.insert(20.0, "b");
        queue.insert(45.0, "c");
        queue.insert(10.0, "a");

        assert_eq!(fire_times(&queue), vec![10.0, 20.0, 45.0]);
        assert_eq!(queue.peek().map(|q| q.payload), Some("a"));
    }

    #[test]
    fn test_earlier_than_everything_goes_first() {
        let mut queue = ScheduleQueue::new();
        queue.insert(5.0, 1);
        queue.insert(1.0, 2);

        assert_eq!(queue.pop_first().map(|q| q.payload), Some(2));
    }

    #[test]
    fn test_ties_pop_in_insertion_order() {
        let mut queue = ScheduleQueue::new();
        queue.insert(3.0, "first");
        queue.insert(1.0, "early");
        queue.insert(3.0, "second");
        queue.insert(3.0, "third");

        let order: Vec<_> = std::iter::from_fn(|| queue.pop_first())
            .map(|q| q.payload)
            .collect();
        assert_eq!(order, vec!["early", "first", "second", "third"]);
    }

    #[test]
    fn test_pop_due_respects_deadline() {
        let mut queue = ScheduleQueue::new();
        queue.insert(10.0, ());
        queue.insert(20.0, ());

        assert!(queue.has_due(10.0));
        assert!(queue.pop_due(10.0).is_some());
        assert!(!queue.has_due(15.0));
        assert!(queue.pop_due(15.0).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_remove_by_identity() {
        let mut queue = ScheduleQueue::new();
        let a = queue.insert(7.0, "same");
        let b = queue.insert(7.0, "same");

        let removed = queue.remove(b).unwrap();
        assert_eq!(removed.id, b);
        assert_eq!(queue.peek().map(|q| q.id), Some(a));
        assert!(queue.remove(b).is_none());
    }

    #[test]
    fn test_remove_first_where() {
        let mut queue = ScheduleQueue::new();
        queue.insert(1.0, 'x');
        queue.insert(2.0, 'y');
        queue.insert(3.0, 'y');

        let removed = queue.remove_first_where(|c| *c == 'y').unwrap();
        assert_eq!(removed.fire_at, 2.0);
        assert_eq!(fire_times(&queue), vec![1.0, 3.0]);
        assert!(queue.remove_first_where(|c| *c == 'z').is_none());
    }

    proptest! {
        #[test]
        fn prop_queue_sorted_with_fifo_ties(times in prop::collection::vec(0u8..20, 0..64)) {
            let mut queue = ScheduleQueue::new();
            for (seq, time) in times.iter().enumerate() {
                queue.insert(f64::from(*time), seq);
            }

            let drained: Vec<_> = std::iter::from_fn(|| queue.pop_first()).collect();
            prop_assert_eq!(drained.len(), times.len());
            for pair in drained.windows(2) {
                prop_assert!(pair[0].fire_at <= pair[1].fire_at);
                if pair[0].fire_at == pair[1].fire_at {
                    prop_assert!(pair[0].payload < pair[1].payload);
                }
            }
        }
    }
}
