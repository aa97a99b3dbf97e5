//! Built-in modal solver.
//!
//! Models the emitter-point response of a cavity as a set of Lorentzian
//! modes on top of a flat radiative background, driven by a Gaussian pulse.
//! It stands in for a full electromagnetic solver so that the pipeline can be
//! exercised end to end: a reference scene has no modes, a device scene adds
//! the cavity modes, and the ratio of the two spectra is the enhancement.

use std::f64::consts::PI;

use cav_core::errors::{CavError, ErrorInfo, Stage};
use cav_harminv::TimeSeries;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decay::{DecayMonitor, DecayStatus};
use crate::solver::{FluxRun, FluxSolver, RunDiagnostics, RunPlan, SourcePulse};
use crate::spectrum::PowerSpectrum;

fn modal_error(code: &str, message: impl Into<String>) -> CavError {
    CavError::InvalidInput(ErrorInfo::new(code, message).with_stage(Stage::SpectrumBuild))
}

fn default_dt() -> f64 {
    0.05
}

fn default_cutoff() -> f64 {
    5.0
}

fn default_background() -> f64 {
    1.0
}

/// One resonant mode of a modal scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CavityMode {
    /// Resonance frequency.
    pub frequency: f64,
    /// Quality factor; must be finite.
    pub q: f64,
    /// Peak power added on top of the background at the resonance.
    pub coupling: f64,
}

impl CavityMode {
    /// Amplitude decay rate `pi * f / Q`.
    pub fn decay_rate(&self) -> f64 {
        PI * self.frequency / self.q
    }

    fn lorentzian(&self, frequency: f64) -> f64 {
        let x = (frequency - self.frequency) * 2.0 * self.q / self.frequency;
        1.0 / (1.0 + x * x)
    }
}

/// Emitter environment understood by [`ModalSolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalScene {
    /// Radiated power of the bare emitter, flat in frequency.
    #[serde(default = "default_background")]
    pub background: f64,
    /// Cavity modes; empty for a reference scene.
    #[serde(default)]
    pub modes: Vec<CavityMode>,
}

impl ModalScene {
    /// Scene with the same background and no modes.
    pub fn reference(&self) -> Self {
        Self {
            background: self.background,
            modes: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), CavError> {
        if !(self.background > 0.0) || !self.background.is_finite() {
            return Err(modal_error(
                "invalid-background",
                format!("background power must be positive, got {}", self.background),
            ));
        }
        for (idx, mode) in self.modes.iter().enumerate() {
            let valid = mode.frequency > 0.0
                && mode.frequency.is_finite()
                && mode.q > 0.0
                && mode.q.is_finite()
                && mode.coupling >= 0.0
                && mode.coupling.is_finite();
            if !valid {
                return Err(CavError::InvalidInput(
                    ErrorInfo::new(
                        "invalid-mode",
                        format!(
                            "mode {idx} needs positive frequency, finite positive Q and non-negative coupling"
                        ),
                    )
                    .with_stage(Stage::SpectrumBuild)
                    .with_record(format!("mode {idx}")),
                ));
            }
        }
        Ok(())
    }

    /// Power spectral response of the scene at `frequency`.
    pub fn response(&self, frequency: f64) -> f64 {
        self.background
            + self
                .modes
                .iter()
                .map(|mode| mode.coupling * mode.lorentzian(frequency))
                .sum::<f64>()
    }
}

/// Time-stepping parameters of the modal solver.
///
/// Power spectra are evaluated analytically from [`ModalScene::response`];
/// time stepping only drives the decay stop and the run diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalSolver {
    /// Time step.
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Pulse half-duration in units of `1 / fwidth`; the source turns off after twice this.
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
}

impl Default for ModalSolver {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            cutoff: default_cutoff(),
        }
    }
}

struct Drive {
    source: SourcePulse,
    width: f64,
    peak: f64,
}

impl Drive {
    fn new(source: &SourcePulse, cutoff: f64) -> Result<Self, CavError> {
        if !(source.frequency > 0.0) || !(source.fwidth > 0.0) {
            return Err(modal_error(
                "invalid-source",
                format!(
                    "source needs positive frequency and width, got {} / {}",
                    source.frequency, source.fwidth
                ),
            ));
        }
        let width = 1.0 / source.fwidth;
        Ok(Self {
            source: *source,
            width,
            peak: cutoff * width,
        })
    }

    fn off_time(&self) -> f64 {
        2.0 * self.peak
    }

    /// Spectral amplitude of the pulse relative to its carrier.
    fn weight(&self, frequency: f64) -> f64 {
        let x = (frequency - self.source.frequency) / self.source.fwidth;
        (-2.0 * PI * PI * x * x).exp()
    }

    fn field(&self, scene: &ModalScene, t: f64) -> f64 {
        let mut value = 0.0;
        if t <= self.off_time() {
            let s = (t - self.peak) / self.width;
            value += scene.background.sqrt()
                * (-0.5 * s * s).exp()
                * (2.0 * PI * self.source.frequency * (t - self.peak)).cos();
        }
        let ramp = smoothstep(t / self.peak);
        let elapsed = (t - self.peak).max(0.0);
        for mode in &scene.modes {
            value += mode.coupling.sqrt()
                * self.weight(mode.frequency)
                * ramp
                * (-mode.decay_rate() * elapsed).exp()
                * (2.0 * PI * mode.frequency * t).cos();
        }
        value
    }
}

fn smoothstep(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

impl ModalSolver {
    fn check(&self) -> Result<(), CavError> {
        if !(self.dt > 0.0) || !self.dt.is_finite() || !(self.cutoff > 0.0) {
            return Err(modal_error(
                "invalid-solver",
                format!("time step and cutoff must be positive, got {} / {}", self.dt, self.cutoff),
            ));
        }
        Ok(())
    }

    /// Field at the emitter point for `record_time` time units after the source turns off.
    pub fn ring_down(
        &self,
        scene: &ModalScene,
        source: &SourcePulse,
        record_time: f64,
    ) -> Result<TimeSeries, CavError> {
        self.check()?;
        scene.validate()?;
        let drive = Drive::new(source, self.cutoff)?;
        let t_off = drive.off_time();
        let first = (t_off / self.dt).ceil() as usize;
        let count = (record_time / self.dt).floor() as usize + 1;
        let values = (first..first + count)
            .map(|step| drive.field(scene, step as f64 * self.dt))
            .collect();
        TimeSeries::uniform(first as f64 * self.dt, self.dt, values)
    }
}

impl FluxSolver for ModalSolver {
    type Scene = ModalScene;

    fn run(&self, scene: &ModalScene, plan: &RunPlan) -> Result<FluxRun, CavError> {
        self.check()?;
        scene.validate()?;
        let drive = Drive::new(&plan.source, self.cutoff)?;
        let t_off = drive.off_time();

        let mut monitor: Option<DecayMonitor> = None;
        let mut step = 0usize;
        let stop_time = loop {
            let t = step as f64 * self.dt;
            if t >= t_off {
                let watcher = monitor.get_or_insert_with(|| plan.stop.monitor(t));
                if watcher.observe(t, drive.field(scene, t))? == DecayStatus::Decayed {
                    break t;
                }
            }
            step += 1;
        };
        let peak_intensity = monitor.as_ref().map_or(0.0, DecayMonitor::run_max);

        let frequencies = plan.window.grid();
        let power = frequencies
            .iter()
            .map(|&f| {
                let w = drive.weight(f);
                w * w * scene.response(f)
            })
            .collect();
        debug!(modes = scene.modes.len(), stop_time, steps = step, "modal run finished");
        Ok(FluxRun {
            spectrum: PowerSpectrum::new(frequencies, power)?,
            diagnostics: RunDiagnostics {
                stop_time,
                steps: step,
                peak_intensity,
            },
        })
    }

    fn method_name(&self) -> &str {
        "modal"
    }
}
