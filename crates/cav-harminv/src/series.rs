use cav_core::errors::{CavError, ErrorInfo, Stage};
use cav_core::table::{Table, XyColumns};
use serde::Serialize;

fn series_error(code: &str, message: impl Into<String>) -> CavError {
    CavError::InvalidInput(ErrorInfo::new(code, message).with_stage(Stage::ResonanceExtraction))
}

const UNIFORM_TOLERANCE: f64 = 1e-6;

/// Field samples of one observable at one monitor point.
///
/// Captured once per simulation run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Builds a series from explicit sample times.
    ///
    /// Times must be finite and strictly increasing; values must be finite.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self, CavError> {
        if times.len() != values.len() {
            return Err(series_error(
                "length-mismatch",
                format!(
                    "time series has {} times but {} values",
                    times.len(),
                    values.len()
                ),
            ));
        }
        if times.len() < 2 {
            return Err(series_error(
                "too-short",
                "time series requires at least two samples",
            ));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(series_error(
                "non-finite-sample",
                format!("sample {idx} is not finite"),
            ));
        }
        if let Some(idx) = times
            .windows(2)
            .position(|pair| !(pair[1] > pair[0]) || !pair[0].is_finite() || !pair[1].is_finite())
        {
            return Err(series_error(
                "non-monotonic-time",
                format!("sample times are not strictly increasing at index {}", idx + 1),
            ));
        }
        Ok(Self { times, values })
    }

    /// Builds a uniformly sampled series starting at `t0` with step `dt`.
    pub fn uniform(t0: f64, dt: f64, values: Vec<f64>) -> Result<Self, CavError> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(series_error(
                "invalid-step",
                format!("sample step must be positive, got {dt}"),
            ));
        }
        let times = (0..values.len()).map(|idx| t0 + idx as f64 * dt).collect();
        Self::new(times, values)
    }

    /// Loads a series from a headed CSV table with declared columns.
    pub fn from_table(table: &Table, columns: &XyColumns) -> Result<Self, CavError> {
        let (times, values) = columns.read(table)?;
        Self::new(times, values)
    }

    /// Sample times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Field values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Uniform sample interval, or an error if the sampling is irregular.
    pub fn sample_interval(&self) -> Result<f64, CavError> {
        let n = self.times.len();
        let dt = (self.times[n - 1] - self.times[0]) / (n - 1) as f64;
        for (idx, pair) in self.times.windows(2).enumerate() {
            let step = pair[1] - pair[0];
            if (step - dt).abs() > UNIFORM_TOLERANCE * dt {
                return Err(CavError::InvalidInput(
                    ErrorInfo::new(
                        "non-uniform-sampling",
                        format!("step {step} at index {idx} deviates from mean step {dt}"),
                    )
                    .with_stage(Stage::ResonanceExtraction)
                    .with_hint("resample the monitor output on a uniform grid"),
                ));
            }
        }
        Ok(dt)
    }
}
