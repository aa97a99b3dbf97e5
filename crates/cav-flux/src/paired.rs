//! Paired reference/device runs.
//!
//! The protocol is split into phase types so that normalisation is only
//! reachable through grid validation:
//!
//! `PairedRun` (configured) -> `ExecutedPair` -> `ValidatedPair` -> `EnhancementSpectrum`.
//!
//! Both runs read one shared [`RunPlan`]; they hold no mutable state in
//! common and may execute on separate threads.

use cav_core::errors::{CavError, ErrorInfo, Stage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decay::DecayStop;
use crate::solver::{FluxRun, FluxSolver, RunDiagnostics, RunPlan};
use crate::spectrum::{EnhancementSpectrum, GridTolerance, PowerSpectrum};
use crate::window::FluxWindow;

/// Configured pair: one plan, no runs yet.
#[derive(Debug, Clone)]
pub struct PairedRun {
    plan: RunPlan,
}

impl PairedRun {
    /// Configures both runs from one window and stopping condition.
    pub fn configure(window: FluxWindow, stop: DecayStop) -> Result<Self, CavError> {
        Ok(Self {
            plan: RunPlan::new(window, stop)?,
        })
    }

    /// Configures both runs from an explicit plan.
    pub fn from_plan(plan: RunPlan) -> Result<Self, CavError> {
        plan.window.validate()?;
        plan.stop.validate()?;
        Ok(Self { plan })
    }

    /// Shared plan.
    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Runs the reference and device scenes under the shared plan.
    ///
    /// With `parallel` set the two runs execute through `rayon::join`.
    pub fn execute<S: FluxSolver>(
        self,
        solver: &S,
        reference: &S::Scene,
        device: &S::Scene,
        parallel: bool,
    ) -> Result<ExecutedPair, CavError> {
        let plan = &self.plan;
        debug!(
            method = solver.method_name(),
            center = plan.window.center,
            half_width = plan.window.half_width,
            points = plan.window.points,
            parallel,
            "starting paired flux runs"
        );
        let (reference_run, device_run) = if parallel {
            rayon::join(
                || tag_run(solver.run(reference, plan), "reference"),
                || tag_run(solver.run(device, plan), "device"),
            )
        } else {
            (
                tag_run(solver.run(reference, plan), "reference"),
                tag_run(solver.run(device, plan), "device"),
            )
        };
        let reference = reference_run?;
        let device = device_run?;
        info!(
            reference_stop = reference.diagnostics.stop_time,
            device_stop = device.diagnostics.stop_time,
            "paired flux runs complete"
        );
        Ok(ExecutedPair {
            plan: self.plan,
            reference,
            device,
        })
    }
}

fn tag_run(result: Result<FluxRun, CavError>, label: &str) -> Result<FluxRun, CavError> {
    result.map_err(|err| match err {
        CavError::DidNotConverge(info) => CavError::DidNotConverge(info.with_record(label)),
        other => other,
    })
}

/// Both runs finished; grids not yet compared.
#[derive(Debug, Clone)]
pub struct ExecutedPair {
    plan: RunPlan,
    reference: FluxRun,
    device: FluxRun,
}

impl ExecutedPair {
    /// Shared plan.
    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Reference run.
    pub fn reference(&self) -> &FluxRun {
        &self.reference
    }

    /// Device run.
    pub fn device(&self) -> &FluxRun {
        &self.device
    }

    /// Checks that both runs reported the same frequency grid.
    pub fn validate(self, tolerance: GridTolerance) -> Result<ValidatedPair, CavError> {
        let mut pair = ValidatedPair::from_spectra(
            self.reference.spectrum,
            self.device.spectrum,
            tolerance,
        )?;
        pair.diagnostics = Some(PairDiagnostics {
            reference: self.reference.diagnostics,
            device: self.device.diagnostics,
        });
        Ok(pair)
    }
}

/// Run statistics of both halves of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairDiagnostics {
    /// Reference run.
    pub reference: RunDiagnostics,
    /// Device run.
    pub device: RunDiagnostics,
}

/// Reference and device spectra on a verified common grid.
#[derive(Debug, Clone)]
pub struct ValidatedPair {
    reference: PowerSpectrum,
    device: PowerSpectrum,
    diagnostics: Option<PairDiagnostics>,
}

impl ValidatedPair {
    /// Validates spectra obtained elsewhere, typically loaded from tables.
    pub fn from_spectra(
        reference: PowerSpectrum,
        device: PowerSpectrum,
        tolerance: GridTolerance,
    ) -> Result<Self, CavError> {
        tolerance.check(reference.frequencies(), device.frequencies())?;
        if reference.frequencies().iter().any(|f| !f.is_finite()) {
            return Err(CavError::InvalidInput(
                ErrorInfo::new("non-finite-grid", "reference grid holds non-finite frequencies")
                    .with_stage(Stage::SpectrumBuild),
            ));
        }
        Ok(Self {
            reference,
            device,
            diagnostics: None,
        })
    }

    /// Reference power.
    pub fn reference(&self) -> &PowerSpectrum {
        &self.reference
    }

    /// Device power.
    pub fn device(&self) -> &PowerSpectrum {
        &self.device
    }

    /// Run statistics when the pair was produced by a solver.
    pub fn diagnostics(&self) -> Option<&PairDiagnostics> {
        self.diagnostics.as_ref()
    }

    /// Enhancement `device / reference`, zero where the reference power is not positive.
    pub fn divide(&self) -> EnhancementSpectrum {
        let spectrum = EnhancementSpectrum::divide(&self.reference, &self.device);
        let zeroed = self.reference.power().iter().filter(|&&p| !(p > 0.0)).count();
        debug!(points = spectrum.len(), zeroed, "normalised device power");
        spectrum
    }
}

/// Configures, executes, validates and divides in one call.
pub fn purcell_spectrum<S: FluxSolver>(
    solver: &S,
    reference: &S::Scene,
    device: &S::Scene,
    plan: RunPlan,
    parallel: bool,
) -> Result<(EnhancementSpectrum, ValidatedPair), CavError> {
    let pair = PairedRun::from_plan(plan)?
        .execute(solver, reference, device, parallel)?
        .validate(GridTolerance::default())?;
    Ok((pair.divide(), pair))
}
