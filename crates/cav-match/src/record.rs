use cav_lines::{EmitterLine, SelectionPath};
use serde::{Deserialize, Serialize};

use crate::wavelength::WavelengthSpectrum;

fn default_baseline_lifetime_ns() -> f64 {
    1.0
}

fn default_tolerance_nm() -> f64 {
    10.0
}

fn default_clip_negative() -> bool {
    true
}

/// Inclusive wavelength acceptance window in nm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceWindow {
    /// Shortest accepted wavelength.
    pub min_nm: f64,
    /// Longest accepted wavelength.
    pub max_nm: f64,
}

impl Default for AcceptanceWindow {
    fn default() -> Self {
        Self {
            min_nm: 560.0,
            max_nm: 590.0,
        }
    }
}

impl AcceptanceWindow {
    /// Whether `wavelength_nm` is accepted.
    pub fn contains(&self, wavelength_nm: f64) -> bool {
        wavelength_nm >= self.min_nm && wavelength_nm <= self.max_nm
    }
}

/// Matching options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchOpts {
    /// Free-space radiative lifetime in ns.
    #[serde(default = "default_baseline_lifetime_ns")]
    pub baseline_lifetime_ns: f64,
    /// Acceptance window for the in-window flag.
    #[serde(default)]
    pub acceptance: AcceptanceWindow,
    /// Half-width of the windowed lookup in nm.
    #[serde(default = "default_tolerance_nm")]
    pub tolerance_nm: f64,
    /// Clip negative enhancement to zero in the wavelength view.
    #[serde(default = "default_clip_negative")]
    pub clip_negative: bool,
}

impl Default for MatchOpts {
    fn default() -> Self {
        Self {
            baseline_lifetime_ns: default_baseline_lifetime_ns(),
            acceptance: AcceptanceWindow::default(),
            tolerance_nm: default_tolerance_nm(),
            clip_negative: default_clip_negative(),
        }
    }
}

/// Matching result for one emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Emitter identity.
    pub emitter: String,
    /// Line energy in eV.
    pub energy_ev: f64,
    /// Line wavelength in nm.
    pub wavelength_nm: f64,
    /// Grid wavelength used for the nearest-point lookup.
    pub matched_wavelength_nm: f64,
    /// Whether the line falls in the acceptance window.
    pub in_window: bool,
    /// Enhancement at the nearest grid point.
    pub enhancement: f64,
    /// Largest enhancement within the tolerance window.
    pub windowed_enhancement: f64,
    /// Absolute detuning from the spectrum peak in nm.
    pub detuning_nm: f64,
    /// `tau_cav / tau_0 = 1 / F`.
    #[serde(with = "cav_core::floats::sentinel")]
    pub lifetime_ratio: f64,
    /// `tau_cav` in ns.
    #[serde(with = "cav_core::floats::sentinel")]
    pub lifetime_ns: f64,
    /// Rules that selected the line.
    pub selection: SelectionPath,
}

/// Lifetime shortening `(tau_cav / tau_0, tau_cav)`; infinite when `F` is not positive.
pub fn lifetime(enhancement: f64, baseline_lifetime_ns: f64) -> (f64, f64) {
    if enhancement > 0.0 {
        (1.0 / enhancement, baseline_lifetime_ns / enhancement)
    } else {
        (f64::INFINITY, f64::INFINITY)
    }
}

/// Matches one line against the spectrum whose peak sits at `peak_nm`.
pub fn match_line(
    line: &EmitterLine,
    spectrum: &WavelengthSpectrum,
    peak_nm: f64,
    opts: &MatchOpts,
) -> MatchRecord {
    let (matched_wavelength_nm, enhancement) = spectrum.nearest(line.wavelength_nm);
    let windowed_enhancement = spectrum.windowed_max(line.wavelength_nm, opts.tolerance_nm);
    let (lifetime_ratio, lifetime_ns) = lifetime(enhancement, opts.baseline_lifetime_ns);
    MatchRecord {
        emitter: line.emitter.clone(),
        energy_ev: line.energy_ev,
        wavelength_nm: line.wavelength_nm,
        matched_wavelength_nm,
        in_window: opts.acceptance.contains(line.wavelength_nm),
        enhancement,
        windowed_enhancement,
        detuning_nm: (line.wavelength_nm - peak_nm).abs(),
        lifetime_ratio,
        lifetime_ns,
        selection: line.selection,
    }
}
