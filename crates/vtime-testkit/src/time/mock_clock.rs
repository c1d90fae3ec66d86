//! Virtual clock implementing `vtime_core::Clock`
//!
//! A [`MockClock`] never touches real timers. `wait` inserts an entry into the
//! schedule it shares with its [`TimeController`](super::TimeController), and
//! nothing fires until the controller steps time forward.

use super::queue::{EntryId, Queued, ScheduleQueue};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use vtime_core::clock::normalize_delay;
use vtime_core::{Action, CancelHandle, Clock};

/// Identity shared by every occurrence of one `wait` registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleId(u64);

/// Inspection view of a pending entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleEntry {
    /// Identity of this occurrence
    pub id: EntryId,
    /// Registration this occurrence belongs to
    pub schedule: ScheduleId,
    /// Virtual time at which the entry fires
    pub fire_at: f64,
    /// Re-arm period for repeating registrations
    pub period: Option<f64>,
}

impl ScheduleEntry {
    /// Whether the entry re-arms itself after firing
    pub fn is_repeating(&self) -> bool {
        self.period.is_some()
    }
}

pub(crate) type SharedAction = Arc<Mutex<Action>>;

/// Queue payload: the action plus what is needed to re-arm it
pub(crate) struct Scheduled {
    pub(crate) schedule: ScheduleId,
    pub(crate) period: Option<f64>,
    pub(crate) action: SharedAction,
}

impl fmt::Debug for Scheduled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduled")
            .field("schedule", &self.schedule)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

fn view(queued: &Queued<Scheduled>) -> ScheduleEntry {
    ScheduleEntry {
        id: queued.id,
        schedule: queued.payload.schedule,
        fire_at: queued.fire_at,
        period: queued.payload.period,
    }
}

/// Virtual time plus pending entries, shared by one clock/controller pair
#[derive(Debug)]
pub(crate) struct ScheduleState {
    pub(crate) now: f64,
    queue: ScheduleQueue<Scheduled>,
    next_schedule: u64,
}

pub(crate) type SharedState = Arc<Mutex<ScheduleState>>;

/// `base + delay`, saturating at the largest finite time
fn fire_time(base: f64, delay: f64) -> f64 {
    (base + delay).min(f64::MAX)
}

impl ScheduleState {
    pub(crate) fn new(start_time: f64) -> Self {
        Self {
            now: start_time,
            queue: ScheduleQueue::new(),
            next_schedule: 0,
        }
    }

    fn register(&mut self, delay: f64, action: Action, repeat: bool) -> ScheduleEntry {
        let schedule = ScheduleId(self.next_schedule);
        self.next_schedule += 1;
        let fire_at = fire_time(self.now, delay);
        let period = repeat.then_some(delay);
        let id = self.queue.insert(
            fire_at,
            Scheduled {
                schedule,
                period,
                action: Arc::new(Mutex::new(action)),
            },
        );
        ScheduleEntry {
            id,
            schedule,
            fire_at,
            period,
        }
    }

    /// Remove whichever occurrence of `schedule` is pending
    fn cancel(&mut self, schedule: ScheduleId) -> Option<ScheduleEntry> {
        self.queue
            .remove_first_where(|scheduled| scheduled.schedule == schedule)
            .map(|queued| view(&queued))
    }

    /// Pop the earliest entry due by `deadline`, move `now` to its fire time
    /// and queue its successor if it repeats.
    pub(crate) fn pop_due(&mut self, deadline: f64) -> Option<(ScheduleEntry, SharedAction)> {
        let queued = self.queue.pop_due(deadline)?;
        let entry = view(&queued);
        self.now = self.now.max(queued.fire_at);

        if let Some(period) = queued.payload.period {
            // Successor is based on the previous fire time, not on `now`
            self.queue.insert(
                fire_time(queued.fire_at, period),
                Scheduled {
                    schedule: queued.payload.schedule,
                    period: Some(period),
                    action: Arc::clone(&queued.payload.action),
                },
            );
        }

        Some((entry, queued.payload.action))
    }

    pub(crate) fn has_due(&self, deadline: f64) -> bool {
        self.queue.has_due(deadline)
    }

    pub(crate) fn peek(&self) -> Option<ScheduleEntry> {
        self.queue.peek().map(view)
    }

    pub(crate) fn entries(&self) -> Vec<ScheduleEntry> {
        self.queue.iter().map(view).collect()
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// `Clock` driven by a [`TimeController`](super::TimeController)
#[derive(Clone)]
pub struct MockClock {
    state: SharedState,
}

impl MockClock {
    pub(crate) fn from_state(state: SharedState) -> Self {
        Self { state }
    }
}

impl fmt::Debug for MockClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockClock")
            .field("now", &state.now)
            .field("pending", &state.pending())
            .finish()
    }
}

impl Clock for MockClock {
    fn now(&self) -> f64 {
        self.state.lock().now
    }

    fn wait(&self, delay: f64, action: Action, repeat: bool) -> CancelHandle {
        let entry = self
            .state
            .lock()
            .register(normalize_delay(delay), action, repeat);
        tracing::trace!(
            entry = %entry.id,
            fire_at = entry.fire_at,
            repeat,
            "Scheduled virtual timer"
        );

        let state: Weak<Mutex<ScheduleState>> = Arc::downgrade(&self.state);
        let schedule = entry.schedule;
        CancelHandle::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let cancelled = state.lock().cancel(schedule);
            if let Some(entry) = cancelled {
                tracing::trace!(entry = %entry.id, fire_at = entry.fire_at, "Cancelled virtual timer");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtime_core::ClockExt;

    fn clock_at(start: f64) -> (MockClock, SharedState) {
        let state = Arc::new(Mutex::new(ScheduleState::new(start)));
        (MockClock::from_state(Arc::clone(&state)), state)
    }

    #[test]
    fn test_fire_time_is_relative_to_now() {
        let (clock, state) = clock_at(12.0);
        clock.wait_once(3.0, || {});

        assert_eq!(clock.now(), 12.0);
        assert_eq!(state.lock().peek().map(|e| e.fire_at), Some(15.0));
    }

    #[test]
    fn test_negative_delay_fires_now() {
        let (clock, state) = clock_at(4.0);
        clock.wait_once(-2.0, || {});
        assert_eq!(state.lock().peek().map(|e| e.fire_at), Some(4.0));
    }

    #[test]
    fn test_repeat_successor_is_drift_free() {
        let (clock, state) = clock_at(0.0);
        clock.every(2.5, || {});

        let mut guard = state.lock();
        let (first, _) = guard.pop_due(100.0).unwrap();
        assert_eq!(first.fire_at, 2.5);
        assert_eq!(guard.now, 2.5);

        let successor = guard.peek().unwrap();
        assert_eq!(successor.fire_at, 5.0);
        assert_eq!(successor.schedule, first.schedule);
        assert_ne!(successor.id, first.id);
    }

    #[test]
    fn test_fire_time_saturates_at_largest_finite_time() {
        let (clock, state) = clock_at(1e300);
        clock.every(f64::MAX, || {});
        assert_eq!(state.lock().peek().map(|e| e.fire_at), Some(f64::MAX));

        state.lock().pop_due(f64::MAX).unwrap();
        let successor = state.lock().peek().unwrap();
        assert_eq!(successor.fire_at, f64::MAX);
        assert!(successor.is_repeating());
    }

    #[test]
    fn test_cancel_targets_current_occurrence() {
        let (clock, state) = clock_at(0.0);
        let cancel = clock.every(1.0, || {});

        state.lock().pop_due(1.0);
        state.lock().pop_due(2.0);
        assert_eq!(state.lock().pending(), 1);

        cancel.cancel();
        assert_eq!(state.lock().pending(), 0);
    }

    #[test]
    fn test_cancel_after_state_dropped_is_harmless() {
        let (clock, state) = clock_at(0.0);
        let cancel = clock.wait_once(1.0, || {});
        drop(clock);
        drop(state);
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }
}
