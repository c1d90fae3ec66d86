//! Unified error type for vtime
//!
//! Every fallible operation in the workspace returns [`TimeError`]. Variants
//! carry the values needed to diagnose the failure in a test log.

/// Error type for clock and controller operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    /// Attempted to move virtual time backwards
    #[error("Cannot move time backwards: target {target}s is before now {now}s")]
    Ordering {
        /// Requested target time in seconds
        target: f64,
        /// Virtual time at the moment of the call
        now: f64,
    },

    /// A time value was NaN or infinite
    #[error("Time value must be finite, got {value}")]
    NonFiniteTime {
        /// The rejected value
        value: f64,
    },

    /// A schedule kept producing entries past the configured limit
    #[error("Ran {limit} steps and still have {pending} pending entries; a repeating schedule was probably never cancelled")]
    RunawaySchedule {
        /// The limit that was exceeded
        limit: usize,
        /// Entries still pending when the limit was hit
        pending: usize,
    },

    /// No async runtime is available to drive real timers
    #[error("Async runtime unavailable: {reason}")]
    RuntimeUnavailable {
        /// Why the runtime could not be reached
        reason: String,
    },

    /// Configuration failed to parse or validate
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfig {
        /// Offending field, or `toml` for parse failures
        field: String,
        /// Description of the problem
        reason: String,
    },
}

impl TimeError {
    /// Create an ordering error
    pub fn ordering(target: f64, now: f64) -> Self {
        Self::Ordering { target, now }
    }

    /// Create a runaway schedule error
    pub fn runaway(limit: usize, pending: usize) -> Self {
        Self::RunawaySchedule { limit, pending }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Reject NaN and infinite time values
    pub fn check_finite(value: f64) -> TimeResult<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::NonFiniteTime { value })
        }
    }
}

/// Result alias used across the workspace
pub type TimeResult<T> = Result<T, TimeError>;
