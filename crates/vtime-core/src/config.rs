//! Configuration for virtual time controllers
//!
//! [`TimeConfig`] carries the knobs of the stepping algorithm. It can be built
//! in code with the `with_*` setters or loaded from TOML:
//!
//! ```toml
//! start_time = 100.0
//! run_all_limit = 500
//! drain_rounds = 4
//! ```
//!
//! Missing keys fall back to [`TimeConfig::default`].

use crate::errors::{TimeError, TimeResult};
use serde::{Deserialize, Serialize};

/// Default iteration cap for `run_all`
pub const DEFAULT_RUN_ALL_LIMIT: usize = 10_000;

/// Default cap on entries fired by a single stepping call
pub const DEFAULT_STEP_FIRING_LIMIT: usize = 1_000_000;

/// Stepping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeConfig {
    /// Virtual time a fresh controller starts at, in seconds
    pub start_time: f64,
    /// Maximum `progress_to` iterations `run_all` performs before giving up
    pub run_all_limit: usize,
    /// Maximum entries a single `progress_to` may fire
    pub step_firing_limit: usize,
    /// Cooperative yields performed by each drain
    pub drain_rounds: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            run_all_limit: DEFAULT_RUN_ALL_LIMIT,
            step_firing_limit: DEFAULT_STEP_FIRING_LIMIT,
            drain_rounds: 1,
        }
    }
}

impl TimeConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> TimeResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TimeError::invalid_config("toml", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML document
    pub fn to_toml_string(&self) -> TimeResult<String> {
        toml::to_string(self).map_err(|e| TimeError::invalid_config("toml", e.to_string()))
    }

    /// Set the starting virtual time
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the `run_all` iteration cap
    pub fn with_run_all_limit(mut self, limit: usize) -> Self {
        self.run_all_limit = limit;
        self
    }

    /// Set the per-step firing cap
    pub fn with_step_firing_limit(mut self, limit: usize) -> Self {
        self.step_firing_limit = limit;
        self
    }

    /// Set the number of yields per drain
    pub fn with_drain_rounds(mut self, rounds: u32) -> Self {
        self.drain_rounds = rounds;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> TimeResult<()> {
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(TimeError::invalid_config(
                "start_time",
                format!("must be a finite, non-negative number (got {})", self.start_time),
            ));
        }
        if self.run_all_limit == 0 {
            return Err(TimeError::invalid_config("run_all_limit", "must be at least 1"));
        }
        if self.step_firing_limit == 0 {
            return Err(TimeError::invalid_config(
                "step_firing_limit",
                "must be at least 1",
            ));
        }
        if self.drain_rounds == 0 {
            return Err(TimeError::invalid_config("drain_rounds", "must be at least 1"));
        }
        Ok(())
    }
}
