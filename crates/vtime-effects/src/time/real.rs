//! Real time handler for production use

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::time::{self, Instant};
use vtime_core::clock::normalize_delay;
use vtime_core::{Action, CancelHandle, Clock, TimeError, TimeResult};

/// Tokio intervals reject a zero period
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Wall-clock `Clock` that schedules actions on tokio timers.
///
/// Each `wait` spawns one task on the runtime captured at construction;
/// cancelling aborts that task.
#[derive(Debug, Clone)]
pub struct RealClock {
    runtime: Handle,
}

impl RealClock {
    /// Create a clock bound to the current tokio runtime
    pub fn new() -> TimeResult<Self> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|e| TimeError::RuntimeUnavailable {
                reason: e.to_string(),
            })
    }

    /// Create a clock that spawns its timers on `runtime`
    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Clock for RealClock {
    #[allow(clippy::disallowed_methods)] // The one place host wall-clock time is read
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64()
    }

    fn wait(&self, delay: f64, mut action: Action, repeat: bool) -> CancelHandle {
        let delay = Duration::try_from_secs_f64(normalize_delay(delay)).unwrap_or(Duration::MAX);
        let period = if repeat { delay.max(MIN_PERIOD) } else { delay };

        let Some(deadline) = Instant::now().checked_add(period) else {
            tracing::debug!(?period, "Delay exceeds timer range; action will never fire");
            return CancelHandle::noop();
        };

        let task = if repeat {
            self.runtime.spawn(async move {
                let mut ticker = time::interval_at(deadline, period);
                loop {
                    ticker.tick().await;
                    action();
                }
            })
        } else {
            self.runtime.spawn(async move {
                time::sleep_until(deadline).await;
                action();
            })
        };

        let abort = task.abort_handle();
        CancelHandle::new(move || abort.abort())
    }
}
