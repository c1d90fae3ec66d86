//! vtime testing infrastructure
//!
//! Deterministic virtual time for code written against `vtime_core::Clock`.
//! [`mock_time`] returns a [`MockClock`] to hand to the code under test and a
//! [`TimeController`] that moves virtual time forward, firing due timers in
//! order and letting async work they trigger settle between firings.
//!
//! ```rust,no_run
//! use vtime_core::ClockExt;
//! use vtime_testkit::mock_time;
//!
//! # async fn demo() -> vtime_core::TimeResult<()> {
//! let (clock, controller) = mock_time();
//! clock.wait_once(10.0, || println!("ten seconds later"));
//!
//! controller.progress(15.0).await?;
//! assert_eq!(controller.now(), 15.0);
//! assert!(controller.next().is_none());
//! # Ok(())
//! # }
//! ```

pub mod time;

pub use time::{
    flush_pending, mock_time, mock_time_with, EntryId, MockClock, ScheduleEntry, ScheduleId,
    ScheduleQueue, TimeController,
};
