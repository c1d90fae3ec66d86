//! vtime effect handlers
//!
//! Production implementations of the `vtime-core` traits. Application code
//! receives a [`RealClock`] in production and a `vtime_testkit::MockClock` in
//! tests; both are used through `vtime_core::Clock`.

pub mod time;

pub use time::RealClock;
