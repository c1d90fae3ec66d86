//! Time effect handlers
//!
//! This module provides the standard implementation of the `Clock` trait
//! defined in `vtime-core`.

pub mod real;

pub use real::RealClock;
