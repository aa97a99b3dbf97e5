//! YAML pipeline configuration.
//!
//! Every section is optional; missing fields take the canonical defaults.

use std::error::Error;
use std::fs;
use std::path::Path;

use cav_core::table::XyColumns;
use cav_core::units::LengthUnit;
use cav_flux::{
    CavityMode, DecayStop, FluxWindow, GridTolerance, ModalScene, ModalSolver,
};
use cav_harminv::{BestMode, HarminvOpts, SearchBand};
use cav_lines::{LineOpts, TransitionColumns};
use cav_match::MatchOpts;
use serde::{Deserialize, Serialize};

fn default_center() -> f64 {
    1.75
}

fn default_bandwidth() -> f64 {
    0.6
}

fn default_half_width_fraction() -> f64 {
    1.0 / 16.0
}

fn default_points() -> usize {
    250
}

fn default_decay() -> DecayStop {
    DecayStop {
        max_time: Some(100_000.0),
        ..DecayStop::default()
    }
}

fn default_parallel() -> bool {
    true
}

fn default_record_time() -> f64 {
    400.0
}

fn default_scene() -> ModalScene {
    ModalScene {
        background: 1.0,
        modes: vec![CavityMode {
            frequency: 1.7391,
            q: 1200.0,
            coupling: 40.0,
        }],
    }
}

fn default_time_series_columns() -> XyColumns {
    XyColumns::new("time", "field")
}

fn default_power_columns() -> XyColumns {
    XyColumns::new("freq(1/um)", "P(a.u.)")
}

fn default_enhancement_columns() -> XyColumns {
    XyColumns::new("freq(1/um)", "Fp")
}

/// Harmonic inversion search band and fit options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarminvSection {
    /// Center-frequency guess.
    #[serde(default = "default_center")]
    pub center: f64,
    /// Full-width guess.
    #[serde(default = "default_bandwidth")]
    pub bandwidth: f64,
    /// Fit options.
    #[serde(flatten)]
    pub opts: HarminvOpts,
}

impl Default for HarminvSection {
    fn default() -> Self {
        Self {
            center: default_center(),
            bandwidth: default_bandwidth(),
            opts: HarminvOpts::default(),
        }
    }
}

impl HarminvSection {
    /// Search band.
    pub fn band(&self) -> SearchBand {
        SearchBand::new(self.center, self.bandwidth)
    }
}

/// Flux window, stopping condition and execution mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxSection {
    /// Absolute half-width; overrides `half_width_fraction` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_width: Option<f64>,
    /// Half-width as a fraction of the best-mode frequency.
    #[serde(default = "default_half_width_fraction")]
    pub half_width_fraction: f64,
    /// Number of grid points.
    #[serde(default = "default_points")]
    pub points: usize,
    /// Decay stop applied to both runs; bounded at 1e5 time units by default.
    #[serde(default = "default_decay")]
    pub decay: DecayStop,
    /// Run reference and device concurrently.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Grid comparison tolerance for loaded tables.
    #[serde(default)]
    pub grid_tolerance: GridTolerance,
}

impl Default for FluxSection {
    fn default() -> Self {
        Self {
            half_width: None,
            half_width_fraction: default_half_width_fraction(),
            points: default_points(),
            decay: default_decay(),
            parallel: default_parallel(),
            grid_tolerance: GridTolerance::default(),
        }
    }
}

impl FluxSection {
    /// Window centered on the best mode.
    pub fn window_for(&self, mode: &BestMode) -> Result<FluxWindow, cav_core::CavError> {
        match self.half_width {
            Some(half_width) => {
                mode.validate()?;
                FluxWindow::new(mode.frequency, half_width, self.points)
            }
            None => FluxWindow::around(mode, self.half_width_fraction, self.points),
        }
    }
}

/// Built-in solver setup used by `simulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Time stepping.
    #[serde(default)]
    pub solver: ModalSolver,
    /// Device scene; the reference scene drops its modes.
    #[serde(default = "default_scene")]
    pub scene: ModalScene,
    /// Ring-down length recorded after the source turns off.
    #[serde(default = "default_record_time")]
    pub record_time: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            solver: ModalSolver::default(),
            scene: default_scene(),
            record_time: default_record_time(),
        }
    }
}

/// Column names of every input and output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schemas {
    /// Ring-down time series.
    #[serde(default = "default_time_series_columns")]
    pub time_series: XyColumns,
    /// Reference and device power tables.
    #[serde(default = "default_power_columns")]
    pub power: XyColumns,
    /// Enhancement table.
    #[serde(default = "default_enhancement_columns")]
    pub enhancement: XyColumns,
    /// Transition table.
    #[serde(default)]
    pub transitions: TransitionColumns,
}

impl Default for Schemas {
    fn default() -> Self {
        Self {
            time_series: default_time_series_columns(),
            power: default_power_columns(),
            enhancement: default_enhancement_columns(),
            transitions: TransitionColumns::default(),
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Solver length unit.
    #[serde(default)]
    pub units: LengthUnit,
    /// Resonance extraction.
    #[serde(default)]
    pub harminv: HarminvSection,
    /// Paired flux runs.
    #[serde(default)]
    pub flux: FluxSection,
    /// Line selection.
    #[serde(default)]
    pub lines: LineOpts,
    /// Spectral matching.
    #[serde(default)]
    pub matching: MatchOpts,
    /// Table schemas.
    #[serde(default)]
    pub schemas: Schemas,
    /// Built-in solver.
    #[serde(default)]
    pub simulation: SimulationSection,
}

/// Loads a configuration file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {err}", path.display()))?;
    if text.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    let config: PipelineConfig = serde_yaml::from_str(&text)
        .map_err(|err| format!("invalid config {}: {err}", path.display()))?;
    Ok(config)
}
