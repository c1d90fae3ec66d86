//! Virtual time: schedule queue, mock clock, stepping controller and drain

pub mod controller;
pub mod drain;
pub mod mock_clock;
pub mod queue;

pub use controller::{mock_time, mock_time_with, TimeController};
pub use drain::flush_pending;
pub use mock_clock::{MockClock, ScheduleEntry, ScheduleId};
pub use queue::{EntryId, Queued, ScheduleQueue};
