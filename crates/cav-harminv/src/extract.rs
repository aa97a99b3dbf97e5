use cav_core::errors::{CavError, ErrorInfo, Stage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::modes::{no_resonance, rank_resonances, quality_factor, Resonance, ResonanceSet};
use crate::pencil::matrix_pencil;
use crate::series::TimeSeries;

fn harminv_error(code: &str, message: impl Into<String>) -> CavError {
    CavError::InvalidInput(ErrorInfo::new(code, message).with_stage(Stage::ResonanceExtraction))
}

const MIN_SAMPLES: usize = 8;
const NYQUIST_MARGIN: f64 = 0.8;

fn default_max_samples() -> usize {
    600
}

fn default_max_modes() -> usize {
    50
}

fn default_svd_threshold() -> f64 {
    1e-9
}

/// Frequency band searched for resonances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBand {
    /// Center-frequency guess.
    pub center: f64,
    /// Full width of the band around the center.
    pub bandwidth: f64,
}

impl SearchBand {
    /// Creates a band from a center guess and a full-width guess.
    pub fn new(center: f64, bandwidth: f64) -> Self {
        Self { center, bandwidth }
    }

    /// Lower band edge.
    pub fn min(&self) -> f64 {
        self.center - 0.5 * self.bandwidth
    }

    /// Upper band edge.
    pub fn max(&self) -> f64 {
        self.center + 0.5 * self.bandwidth
    }

    fn contains(&self, frequency: f64) -> bool {
        frequency >= self.min() && frequency <= self.max()
    }

    fn validate(&self) -> Result<(), CavError> {
        if !(self.center > 0.0) || !(self.bandwidth > 0.0) || !self.max().is_finite() {
            return Err(harminv_error(
                "invalid-band",
                format!(
                    "search band needs positive center and bandwidth, got {} / {}",
                    self.center, self.bandwidth
                ),
            ));
        }
        Ok(())
    }
}

/// Tuning knobs for harmonic inversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarminvOpts {
    /// Upper bound on the number of samples entering the fit.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    /// Upper bound on the model order.
    #[serde(default = "default_max_modes")]
    pub max_modes: usize,
    /// Relative singular-value cut separating signal from noise.
    #[serde(default = "default_svd_threshold")]
    pub svd_threshold: f64,
    /// Modes whose amplitude is below this fraction of the largest retained
    /// amplitude are dropped. Zero keeps every mode.
    #[serde(default)]
    pub min_relative_amplitude: f64,
}

impl Default for HarminvOpts {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            max_modes: default_max_modes(),
            svd_threshold: default_svd_threshold(),
            min_relative_amplitude: 0.0,
        }
    }
}

/// Picks the decimation stride and the number of samples kept.
///
/// The stride keeps the band's upper edge below a fraction of the decimated
/// Nyquist frequency; if the decimated series is still longer than
/// `max_samples`, only the earliest samples are kept.
fn decimation(len: usize, dt: f64, band: &SearchBand, max_samples: usize) -> (usize, usize) {
    let alias_limit = ((NYQUIST_MARGIN * 0.5) / (band.max() * dt)).floor();
    let alias_limit = if alias_limit.is_finite() && alias_limit >= 1.0 {
        alias_limit as usize
    } else {
        1
    };
    let wanted = len.div_ceil(max_samples.max(MIN_SAMPLES));
    let stride = wanted.min(alias_limit).max(1);
    let kept = len.div_ceil(stride).min(max_samples.max(MIN_SAMPLES));
    (stride, kept)
}

/// Runs harmonic inversion and returns every resonance inside the band.
///
/// The returned set may be empty; see [`extract_resonances`] for the variant
/// that reports an empty set as `NoResonanceFound`.
pub fn harminv(
    series: &TimeSeries,
    band: &SearchBand,
    opts: &HarminvOpts,
) -> Result<ResonanceSet, CavError> {
    band.validate()?;
    if series.len() < MIN_SAMPLES {
        return Err(harminv_error(
            "too-few-samples",
            format!(
                "harmonic inversion needs at least {MIN_SAMPLES} samples, got {}",
                series.len()
            ),
        ));
    }
    let dt = series.sample_interval()?;
    let (stride, kept) = decimation(series.len(), dt, band, opts.max_samples);
    let samples: Vec<f64> = series
        .values()
        .iter()
        .step_by(stride)
        .take(kept)
        .copied()
        .collect();
    let step = dt * stride as f64;
    debug!(stride, kept, step, "decimated ring-down for harmonic inversion");

    let fit = matrix_pencil(&samples, opts.max_modes.max(1), opts.svd_threshold)?;
    let max_amplitude = fit
        .amplitudes
        .iter()
        .map(|a| a.norm())
        .fold(0.0_f64, f64::max);

    let mut modes = Vec::new();
    for (pole, amplitude) in fit.poles.iter().zip(fit.amplitudes.iter()) {
        let frequency = pole.arg() / (2.0 * std::f64::consts::PI * step);
        let decay_rate = -pole.norm().ln() / step;
        if !(frequency > 0.0) || !band.contains(frequency) {
            continue;
        }
        if decay_rate < 0.0 {
            debug!(frequency, decay_rate, "discarding growing mode");
            continue;
        }
        if max_amplitude > 0.0 && amplitude.norm() < opts.min_relative_amplitude * max_amplitude {
            continue;
        }
        modes.push(Resonance {
            frequency,
            q: quality_factor(frequency, decay_rate),
            decay_rate,
            amplitude: Some(*amplitude),
        });
    }
    rank_resonances(&mut modes);

    for mode in &modes {
        debug!(frequency = mode.frequency, q = mode.q, decay = mode.decay_rate, "resonance");
    }
    info!(
        found = modes.len(),
        order = fit.order(),
        residual = fit.residual,
        "harmonic inversion complete"
    );

    Ok(ResonanceSet {
        modes,
        band_min: band.min(),
        band_max: band.max(),
        model_order: fit.order(),
        stride,
        samples_used: samples.len(),
        fit_residual: fit.residual,
    })
}

/// Extracts ranked resonances, reporting an empty band as `NoResonanceFound`.
pub fn extract_resonances(
    series: &TimeSeries,
    band: &SearchBand,
    opts: &HarminvOpts,
) -> Result<ResonanceSet, CavError> {
    let set = harminv(series, band, opts)?;
    if set.modes.is_empty() {
        return Err(no_resonance(set.band_min, set.band_max));
    }
    Ok(set)
}
