use std::cmp::Ordering;

use cav_core::errors::{CavError, ErrorInfo, Stage};
use cav_core::units::LengthUnit;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// A single damped oscillation extracted from a ring-down signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resonance {
    /// Real frequency in inverse solver length units.
    pub frequency: f64,
    /// Quality factor `pi * f / decay_rate`; infinite for an undamped mode.
    #[serde(with = "cav_core::floats::sentinel")]
    pub q: f64,
    /// Amplitude decay rate (envelope `exp(-decay_rate * t)`).
    pub decay_rate: f64,
    /// Complex amplitude of the positive-frequency component, when fitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<Complex64>,
}

impl Resonance {
    /// Builds a resonance from its frequency and decay rate.
    pub fn from_decay(frequency: f64, decay_rate: f64) -> Self {
        Self {
            frequency,
            q: quality_factor(frequency, decay_rate),
            decay_rate,
            amplitude: None,
        }
    }

    /// Vacuum wavelength of the mode in nm.
    pub fn wavelength_nm(&self, unit: &LengthUnit) -> f64 {
        unit.frequency_to_nm(self.frequency)
    }
}

/// `Q = omega / (2 gamma)` for an amplitude decay rate `gamma`.
pub fn quality_factor(frequency: f64, decay_rate: f64) -> f64 {
    if decay_rate == 0.0 {
        f64::INFINITY
    } else {
        std::f64::consts::PI * frequency / decay_rate
    }
}

/// Orders resonances by descending Q, breaking ties by ascending frequency.
pub fn compare_by_quality(a: &Resonance, b: &Resonance) -> Ordering {
    b.q.total_cmp(&a.q)
        .then_with(|| a.frequency.total_cmp(&b.frequency))
}

/// Sorts resonances in place so the best mode comes first.
pub fn rank_resonances(modes: &mut [Resonance]) {
    modes.sort_by(compare_by_quality);
}

/// Persisted descriptor of the highest-Q mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestMode {
    /// Mode frequency in inverse solver length units.
    pub frequency: f64,
    /// Quality factor of the mode.
    #[serde(with = "cav_core::floats::sentinel")]
    pub q: f64,
    /// Vacuum wavelength in nm.
    pub wavelength_nm: f64,
}

impl BestMode {
    /// Derives the descriptor for a resonance.
    pub fn from_resonance(mode: &Resonance, unit: &LengthUnit) -> Self {
        Self {
            frequency: mode.frequency,
            q: mode.q,
            wavelength_nm: mode.wavelength_nm(unit),
        }
    }

    /// Validates a descriptor loaded from disk.
    pub fn validate(&self) -> Result<(), CavError> {
        if !(self.frequency > 0.0) || !self.frequency.is_finite() {
            return Err(CavError::InvalidInput(
                ErrorInfo::new(
                    "invalid-best-mode",
                    format!("best-mode frequency must be positive, got {}", self.frequency),
                )
                .with_stage(Stage::SpectrumBuild),
            ));
        }
        Ok(())
    }
}

/// Ranked resonances plus fit diagnostics for one time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonanceSet {
    /// Resonances sorted by [`compare_by_quality`].
    pub modes: Vec<Resonance>,
    /// Lower edge of the search band.
    pub band_min: f64,
    /// Upper edge of the search band.
    pub band_max: f64,
    /// Number of poles retained by the SVD truncation.
    pub model_order: usize,
    /// Decimation stride applied before fitting.
    pub stride: usize,
    /// Number of samples entering the fit.
    pub samples_used: usize,
    /// Relative residual `|y - y_fit| / |y|` of the full pole model.
    pub fit_residual: f64,
}

impl ResonanceSet {
    /// Highest-Q resonance, if any.
    pub fn best(&self) -> Option<&Resonance> {
        self.modes.first()
    }

    /// Best-mode descriptor; reports `NoResonanceFound` for an empty set.
    pub fn best_mode(&self, unit: &LengthUnit) -> Result<BestMode, CavError> {
        self.best()
            .map(|mode| BestMode::from_resonance(mode, unit))
            .ok_or_else(|| no_resonance(self.band_min, self.band_max))
    }
}

pub(crate) fn no_resonance(band_min: f64, band_max: f64) -> CavError {
    CavError::NoResonanceFound(
        ErrorInfo::new(
            "empty-band",
            format!("no resonance between {band_min} and {band_max}"),
        )
        .with_stage(Stage::ResonanceExtraction)
        .with_context("band_min", band_min.to_string())
        .with_context("band_max", band_max.to_string())
        .with_hint("widen the bandwidth guess or re-run the simulation with a longer ring-down"),
    )
}
