//! vtime core interfaces
//!
//! This crate defines the time abstraction that application code depends on:
//! the [`Clock`] trait, the [`CancelHandle`] returned by every scheduling call,
//! the unified [`TimeError`] type and the [`TimeConfig`] shared by the
//! implementations.
//!
//! Implementations live in sibling crates:
//! - `vtime-effects`: `RealClock`, backed by tokio timers and the system clock
//! - `vtime-testkit`: `MockClock` and `TimeController` for deterministic tests
//!
//! ```rust
//! use vtime_core::{Clock, ClockExt};
//!
//! fn schedule_heartbeat(clock: &dyn Clock) -> vtime_core::CancelHandle {
//!     clock.every(30.0, || tracing::info!("heartbeat"))
//! }
//! ```

pub mod clock;
pub mod config;
pub mod errors;

pub use clock::{Action, Cancel, CancelHandle, Clock, ClockExt};
pub use config::TimeConfig;
pub use errors::{TimeError, TimeResult};
