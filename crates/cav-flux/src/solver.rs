//! Field-solver seam for flux runs.
//!
//! A [`FluxSolver`] receives a scene and a [`RunPlan`] and returns the power
//! collected on the plan's frequency grid. The pipeline never looks inside a
//! scene, so external electromagnetic solvers and the built-in
//! [`ModalSolver`](crate::modal::ModalSolver) are interchangeable.

use cav_core::errors::CavError;
use serde::{Deserialize, Serialize};

use crate::decay::DecayStop;
use crate::spectrum::PowerSpectrum;
use crate::window::FluxWindow;

/// Gaussian excitation pulse placed at the emitter position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourcePulse {
    /// Carrier frequency.
    pub frequency: f64,
    /// Spectral width of the pulse.
    pub fwidth: f64,
}

impl SourcePulse {
    /// Pulse covering a flux window: centered on it with `fwidth` equal to its full width.
    pub fn covering(window: &FluxWindow) -> Self {
        Self {
            frequency: window.center,
            fwidth: 2.0 * window.half_width,
        }
    }
}

/// Everything two paired runs must share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunPlan {
    /// Frequency window on which power is collected.
    pub window: FluxWindow,
    /// Excitation.
    pub source: SourcePulse,
    /// Stopping condition evaluated after the source has turned off.
    pub stop: DecayStop,
}

impl RunPlan {
    /// Plan with a source pulse covering the window.
    pub fn new(window: FluxWindow, stop: DecayStop) -> Result<Self, CavError> {
        window.validate()?;
        stop.validate()?;
        Ok(Self {
            window,
            source: SourcePulse::covering(&window),
            stop,
        })
    }
}

/// Run statistics reported next to the spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// Simulated time at which the decay stop fired.
    pub stop_time: f64,
    /// Number of time steps taken.
    pub steps: usize,
    /// Largest squared field seen by the decay monitor.
    pub peak_intensity: f64,
}

/// Output of one flux run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxRun {
    /// Power on the plan's grid.
    pub spectrum: PowerSpectrum,
    /// Run statistics.
    pub diagnostics: RunDiagnostics,
}

/// Interface every flux-capable field solver implements.
pub trait FluxSolver: Sync {
    /// Scene description understood by the solver.
    type Scene: Sync;

    /// Runs one simulation of `scene` under `plan`.
    fn run(&self, scene: &Self::Scene, plan: &RunPlan) -> Result<FluxRun, CavError>;

    /// Human readable name of the method.
    fn method_name(&self) -> &str;
}
