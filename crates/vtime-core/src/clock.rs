//! Clock trait definitions
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `vtime-effects` (real timers), `vtime-testkit` (virtual time)
//! - **Usage**: Any code that reads the time or schedules delayed work
//!
//! Time is measured in seconds as `f64`. Scheduling returns a [`CancelHandle`]
//! that stops future firings of the scheduled action.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A scheduled callback. Repeating schedules invoke the same action on every firing.
pub type Action = Box<dyn FnMut() + Send + 'static>;

/// Time source and timer scheduler.
///
/// Implementations must keep `now` non-decreasing. `wait` never blocks: it
/// registers the action and returns immediately.
pub trait Clock: Send + Sync {
    /// Current time in seconds.
    fn now(&self) -> f64;

    /// Schedule `action` to fire `delay` seconds from now.
    ///
    /// With `repeat` set the action fires every `delay` seconds until the
    /// returned handle is cancelled.
    fn wait(&self, delay: f64, action: Action, repeat: bool) -> CancelHandle;
}

/// Blanket implementation for Arc<T> where T: Clock
impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> f64 {
        (**self).now()
    }

    fn wait(&self, delay: f64, action: Action, repeat: bool) -> CancelHandle {
        (**self).wait(delay, action, repeat)
    }
}

/// Closure-friendly helpers available on every [`Clock`].
pub trait ClockExt: Clock {
    /// Run `f` once after `delay` seconds.
    fn wait_once<F>(&self, delay: f64, f: F) -> CancelHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let mut f = Some(f);
        self.wait(
            delay,
            Box::new(move || {
                if let Some(f) = f.take() {
                    f();
                }
            }),
            false,
        )
    }

    /// Run `f` every `period` seconds until cancelled.
    fn every<F>(&self, period: f64, f: F) -> CancelHandle
    where
        F: FnMut() + Send + 'static,
    {
        self.wait(period, Box::new(f), true)
    }
}

impl<T: Clock + ?Sized> ClockExt for T {}

/// Clamp a requested delay to a usable value.
///
/// Negative and non-finite delays are treated as zero.
pub fn normalize_delay(delay: f64) -> f64 {
    if delay.is_finite() && delay >= 0.0 {
        delay
    } else {
        tracing::warn!(delay, "Clamping invalid delay to zero");
        0.0
    }
}

/// Implementation-side cancellation hook behind a [`CancelHandle`].
pub trait Cancel: Send + Sync {
    /// Stop the associated schedule. Called at most once per handle.
    fn cancel(&self);
}

impl<F> Cancel for F
where
    F: Fn() + Send + Sync,
{
    fn cancel(&self) {
        self()
    }
}

struct CancelInner {
    cancelled: AtomicBool,
    target: Option<Box<dyn Cancel>>,
}

/// Handle returned by [`Clock::wait`].
///
/// Clones share state: cancelling through any clone cancels the schedule, and
/// only the first call reaches the implementation.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

impl CancelHandle {
    /// Wrap an implementation-specific cancellation hook
    pub fn new(target: impl Cancel + 'static) -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                target: Some(Box::new(target)),
            }),
        }
    }

    /// A handle with nothing to cancel
    pub fn noop() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                target: None,
            }),
        }
    }

    /// Stop future firings. Safe to call repeatedly.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(target) = &self.inner.target {
            target.cancel();
        }
    }

    /// Whether `cancel` has been called on this handle or a clone of it
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Records registrations and fires actions on demand
    #[derive(Default)]
    struct RecordingClock {
        scheduled: Mutex<Vec<(f64, bool, Action)>>,
    }

    impl RecordingClock {
        fn fire_all(&self) {
            for (_, _, action) in self.scheduled.lock().iter_mut() {
                action();
            }
        }
    }

    impl Clock for RecordingClock {
        fn now(&self) -> f64 {
            0.0
        }

        fn wait(&self, delay: f64, action: Action, repeat: bool) -> CancelHandle {
            self.scheduled.lock().push((delay, repeat, action));
            CancelHandle::noop()
        }
    }

    #[test]
    fn test_cancel_reaches_target_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = CancelHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let clone = handle.clone();

        assert!(!handle.is_cancelled());
        handle.cancel();
        clone.cancel();
        handle.cancel();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_noop_handle() {
        let handle = CancelHandle::noop();
        handle.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_wait_once_runs_at_most_once() {
        let clock = RecordingClock::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        clock.wait_once(2.5, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        clock.fire_all();
        clock.fire_all();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let scheduled = clock.scheduled.lock();
        assert_eq!(scheduled[0].0, 2.5);
        assert!(!scheduled[0].1);
    }

    #[test]
    fn test_every_registers_repeating_action() {
        let clock = Arc::new(RecordingClock::default());
        let shared: Arc<dyn Clock> = clock.clone();
        let _handle = shared.every(10.0, || {});

        let scheduled = clock.scheduled.lock();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].0, 10.0);
        assert!(scheduled[0].1);
    }

    #[test]
    fn test_normalize_delay() {
        assert_eq!(normalize_delay(1.5), 1.5);
        assert_eq!(normalize_delay(0.0), 0.0);
        assert_eq!(normalize_delay(-3.0), 0.0);
        assert_eq!(normalize_delay(f64::NAN), 0.0);
        assert_eq!(normalize_delay(f64::INFINITY), 0.0);
    }
}
