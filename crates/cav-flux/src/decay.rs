//! Decay-based stopping condition for transient runs.
//!
//! The monitor watches the squared field at one point. Every
//! `check_interval` time units the largest `|field|^2` seen during the last
//! interval is compared with the largest value seen over the whole run; the
//! run stops once the former has fallen to `relative_decay` times the latter.

use cav_core::errors::{CavError, ErrorInfo, Stage};
use serde::{Deserialize, Serialize};

fn default_check_interval() -> f64 {
    50.0
}

fn default_relative_decay() -> f64 {
    1e-8
}

/// Configuration of the decay stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayStop {
    /// Length of one comparison interval in solver time units.
    #[serde(default = "default_check_interval")]
    pub check_interval: f64,
    /// Required ratio between the recent and the running maximum intensity.
    #[serde(default = "default_relative_decay")]
    pub relative_decay: f64,
    /// Upper bound on the monitored time.
    ///
    /// `None` steps until the field decays, which for a high-Q mode can take
    /// millions of steps. The `cav-sim` configuration defaults to a finite
    /// bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<f64>,
}

impl Default for DecayStop {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            relative_decay: default_relative_decay(),
            max_time: None,
        }
    }
}

impl DecayStop {
    /// Checks the stop parameters.
    pub fn validate(&self) -> Result<(), CavError> {
        let bad = !(self.check_interval > 0.0)
            || !self.check_interval.is_finite()
            || !(self.relative_decay > 0.0)
            || self.max_time.map_or(false, |t| !(t > 0.0));
        if bad {
            return Err(CavError::InvalidInput(
                ErrorInfo::new(
                    "invalid-decay-stop",
                    format!(
                        "decay stop needs positive interval, factor and bound, got {} / {} / {:?}",
                        self.check_interval, self.relative_decay, self.max_time
                    ),
                )
                .with_stage(Stage::SpectrumBuild),
            ));
        }
        Ok(())
    }

    /// Starts a monitor whose first interval begins at `start`.
    pub fn monitor(&self, start: f64) -> DecayMonitor {
        DecayMonitor {
            stop: *self,
            start,
            interval_end: start + self.check_interval,
            interval_max: 0.0,
            run_max: 0.0,
        }
    }
}

/// Outcome of feeding one sample to a [`DecayMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayStatus {
    /// Keep stepping.
    Running,
    /// The observable has decayed by the configured factor.
    Decayed,
}

/// Running state of a decay stop.
#[derive(Debug, Clone)]
pub struct DecayMonitor {
    stop: DecayStop,
    start: f64,
    interval_end: f64,
    interval_max: f64,
    run_max: f64,
}

impl DecayMonitor {
    /// Feeds the field value sampled at time `t`.
    ///
    /// Samples must arrive in increasing time order. Returns `DidNotConverge`
    /// once `t` passes the configured `max_time` without the stop firing.
    pub fn observe(&mut self, t: f64, value: f64) -> Result<DecayStatus, CavError> {
        let intensity = value * value;
        let mut status = DecayStatus::Running;
        if t >= self.interval_end {
            if self.interval_max <= self.stop.relative_decay * self.run_max {
                status = DecayStatus::Decayed;
            }
            self.interval_max = 0.0;
            self.interval_end += self.stop.check_interval;
        }
        self.interval_max = self.interval_max.max(intensity);
        self.run_max = self.run_max.max(intensity);
        if status == DecayStatus::Decayed {
            return Ok(status);
        }
        if let Some(max_time) = self.stop.max_time {
            if t - self.start > max_time {
                return Err(CavError::DidNotConverge(
                    ErrorInfo::new(
                        "decay-timeout",
                        format!(
                            "field did not decay by {} within {max_time} time units",
                            self.stop.relative_decay
                        ),
                    )
                    .with_stage(Stage::SpectrumBuild)
                    .with_context("run_max", self.run_max.to_string())
                    .with_context("interval_max", self.interval_max.to_string())
                    .with_hint("raise max_time or relax relative_decay"),
                ));
            }
        }
        Ok(status)
    }

    /// Largest squared field seen so far.
    pub fn run_max(&self) -> f64 {
        self.run_max
    }
}
