//! Stepping controller for a [`MockClock`]
//!
//! Every stepping operation is built from the same primitive: pop the earliest
//! due entry, move virtual time to its fire time, run its action, then drain
//! already-queued async work so that anything the action kicked off (including
//! new zero-delay timers) settles before the next due-check.

use super::drain::flush_pending;
use super::mock_clock::{MockClock, ScheduleEntry, ScheduleState, SharedState};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use vtime_core::{TimeConfig, TimeError, TimeResult};

/// Create an isolated clock/controller pair starting at time zero
pub fn mock_time() -> (MockClock, TimeController) {
    let controller = TimeController::from_config(TimeConfig::default());
    (controller.clock(), controller)
}

/// Create an isolated clock/controller pair from a validated configuration
pub fn mock_time_with(config: TimeConfig) -> TimeResult<(MockClock, TimeController)> {
    let controller = TimeController::new(config)?;
    Ok((controller.clock(), controller))
}

/// Drives virtual time for the [`MockClock`]s it hands out.
///
/// Clones control the same schedule.
#[derive(Clone)]
pub struct TimeController {
    state: SharedState,
    config: TimeConfig,
}

impl TimeController {
    /// Create a controller after validating `config`
    pub fn new(config: TimeConfig) -> TimeResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: TimeConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScheduleState::new(config.start_time))),
            config,
        }
    }

    /// A clock reading and scheduling against this controller
    pub fn clock(&self) -> MockClock {
        MockClock::from_state(Arc::clone(&self.state))
    }

    /// Configuration in effect
    pub fn config(&self) -> &TimeConfig {
        &self.config
    }

    /// Current virtual time in seconds
    pub fn now(&self) -> f64 {
        self.state.lock().now
    }

    /// Earliest pending entry, if any
    pub fn next(&self) -> Option<ScheduleEntry> {
        self.state.lock().peek()
    }

    /// Snapshot of all pending entries in fire order
    pub fn queue(&self) -> Vec<ScheduleEntry> {
        self.state.lock().entries()
    }

    /// Number of pending entries
    pub fn pending(&self) -> usize {
        self.state.lock().pending()
    }

    /// Advance virtual time by `delta` seconds. Returns the number of entries fired.
    pub async fn progress(&self, delta: f64) -> TimeResult<usize> {
        let target = self.now() + delta;
        self.progress_to(target).await
    }

    /// Advance virtual time to `target`, firing every entry due on the way.
    ///
    /// Returns the number of entries fired. Fails without touching any state if
    /// `target` lies before the current time.
    pub async fn progress_to(&self, target: f64) -> TimeResult<usize> {
        let target = TimeError::check_finite(target)?;
        let now = self.now();
        if target < now {
            return Err(TimeError::ordering(target, now));
        }

        let limit = self.config.step_firing_limit;
        let mut fired = 0;
        loop {
            // The lock is released before the action runs so it may schedule or cancel
            let due = self.state.lock().pop_due(target);
            let Some((entry, action)) = due else {
                break;
            };

            trace!(entry = %entry.id, fire_at = entry.fire_at, "Firing virtual timer");
            {
                let mut action = action.lock();
                (*action)();
            }
            fired += 1;
            self.flush_pending().await;

            if fired >= limit && self.state.lock().has_due(target) {
                let pending = self.pending();
                warn!(limit, pending, now = self.now(), to = target, "Step firing limit exceeded");
                return Err(TimeError::runaway(limit, pending));
            }
        }

        {
            let mut state = self.state.lock();
            state.now = state.now.max(target);
        }
        self.flush_pending().await;

        debug!(to = target, fired, pending = self.pending(), "Progressed virtual time");
        Ok(fired)
    }

    /// Step to each next entry until the queue is empty, using the configured limit.
    ///
    /// Returns the total number of entries fired.
    pub async fn run_all(&self) -> TimeResult<usize> {
        self.run_all_with_limit(self.config.run_all_limit).await
    }

    /// Step to each next entry until the queue is empty.
    ///
    /// Fails with [`TimeError::RunawaySchedule`] after `limit` steps with
    /// entries still pending; time and queue keep the progress made so far.
    pub async fn run_all_with_limit(&self, limit: usize) -> TimeResult<usize> {
        let mut fired = 0;
        for _ in 0..limit {
            let Some(next) = self.next() else {
                return Ok(fired);
            };
            fired += self.progress_to(next.fire_at).await?;
        }

        match self.pending() {
            0 => Ok(fired),
            pending => {
                warn!(limit, pending, now = self.now(), "run_all limit exceeded");
                Err(TimeError::runaway(limit, pending))
            }
        }
    }

    /// Let async work that is already queued run, without advancing time
    pub async fn flush_pending(&self) {
        flush_pending(self.config.drain_rounds).await;
    }
}

impl fmt::Debug for TimeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TimeController")
            .field("now", &state.now)
            .field("pending", &state.pending())
            .field("config", &self.config)
            .finish()
    }
}
