//! Stage drivers shared by the subcommands.
//!
//! Each driver reads its declared tables, runs one pipeline stage and writes
//! its artefacts only after the stage has succeeded.

use std::error::Error;
use std::fs;
use std::path::Path;

use cav_core::floats::format_sentinel_f64;
use cav_core::table::{write_csv, Table};
use cav_core::{to_canonical_json_bytes, CavError};
use cav_flux::{
    EnhancementSpectrum, FluxSolver, PairedRun, PowerSpectrum, RunPlan, SpectrumPeak,
    ValidatedPair,
};
use cav_harminv::{extract_resonances, BestMode, ResonanceSet, TimeSeries};
use cav_lines::{extract_lines, load_transitions, EmitterLine};
use cav_match::{match_lines, MatchTable};
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;

/// File names of the stage artefacts.
pub mod files {
    /// Ranked resonances.
    pub const MODES: &str = "modes.json";
    /// Best-mode descriptor.
    pub const BEST_MODE: &str = "best_mode.json";
    /// Recorded ring-down.
    pub const RINGDOWN: &str = "ringdown.csv";
    /// Reference power table.
    pub const REFERENCE_POWER: &str = "ref_power.csv";
    /// Device power table.
    pub const DEVICE_POWER: &str = "device_power.csv";
    /// Enhancement table.
    pub const ENHANCEMENT: &str = "purcell_spectrum.csv";
    /// Enhancement peak.
    pub const PEAK: &str = "purcell_peak.json";
    /// Selected emitter lines.
    pub const LINES: &str = "lines.json";
    /// Matching report.
    pub const MATCHING_JSON: &str = "matching.json";
    /// Matching table.
    pub const MATCHING_CSV: &str = "matching.csv";
    /// LaTeX rendering.
    pub const MATCHING_TEX: &str = "matching.tex";
    /// Plain-text rendering.
    pub const MATCHING_TXT: &str = "matching.txt";
    /// Detuning-vs-enhancement relationship.
    pub const TOLERANCE: &str = "tolerance.csv";
}

pub(crate) fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), Box<dyn Error>> {
    fs::write(path, to_canonical_json_bytes(value)?)?;
    Ok(())
}

/// Output of the resonance stage.
#[derive(Debug, Clone)]
pub struct ResonanceOutcome {
    /// Ranked resonances.
    pub set: ResonanceSet,
    /// Best-mode descriptor.
    pub best: BestMode,
}

fn extract_stage(series: &TimeSeries, config: &PipelineConfig) -> Result<ResonanceOutcome, CavError> {
    let set = extract_resonances(series, &config.harminv.band(), &config.harminv.opts)?;
    let best = set.best_mode(&config.units)?;
    info!(
        frequency = best.frequency,
        q = best.q,
        wavelength_nm = best.wavelength_nm,
        "best cavity mode"
    );
    Ok(ResonanceOutcome { set, best })
}

fn write_resonance_stage(outcome: &ResonanceOutcome, out: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(out)?;
    write_json(out.join(files::MODES), &outcome.set)?;
    write_json(out.join(files::BEST_MODE), &outcome.best)?;
    Ok(())
}

/// Extracts resonances from a ring-down series and writes `modes.json` and `best_mode.json`.
pub fn resonances(
    series: &TimeSeries,
    config: &PipelineConfig,
    out: &Path,
) -> Result<ResonanceOutcome, Box<dyn Error>> {
    let outcome = extract_stage(series, config)?;
    write_resonance_stage(&outcome, out)?;
    Ok(outcome)
}

/// Reads a ring-down table and runs [`resonances`].
pub fn resonances_from_table(
    series_path: &Path,
    config: &PipelineConfig,
    out: &Path,
) -> Result<ResonanceOutcome, Box<dyn Error>> {
    let table = Table::read_path(series_path)?;
    let series = TimeSeries::from_table(&table, &config.schemas.time_series)?;
    resonances(&series, config, out)
}

/// Output of the spectrum stage.
#[derive(Debug, Clone)]
pub struct SpectrumOutcome {
    /// Enhancement spectrum.
    pub enhancement: EnhancementSpectrum,
    /// Enhancement peak, if any grid value is finite.
    pub peak: Option<SpectrumPeak>,
}

fn write_spectrum_stage(
    pair: &ValidatedPair,
    config: &PipelineConfig,
    out: &Path,
) -> Result<SpectrumOutcome, Box<dyn Error>> {
    let enhancement = pair.divide();
    let peak = enhancement.peak(&config.units);
    fs::create_dir_all(out)?;
    pair.reference()
        .write_csv(out.join(files::REFERENCE_POWER), &config.schemas.power)?;
    pair.device()
        .write_csv(out.join(files::DEVICE_POWER), &config.schemas.power)?;
    enhancement.write_csv(out.join(files::ENHANCEMENT), &config.schemas.enhancement)?;
    write_json(out.join(files::PEAK), &peak)?;
    if let Some(peak) = &peak {
        info!(
            enhancement = peak.enhancement,
            frequency = peak.frequency,
            wavelength_nm = peak.wavelength_nm,
            "purcell peak"
        );
    }
    Ok(SpectrumOutcome { enhancement, peak })
}

/// Normalises device power tables against reference power tables.
pub fn purcell_from_tables(
    reference_path: &Path,
    device_path: &Path,
    config: &PipelineConfig,
    out: &Path,
) -> Result<SpectrumOutcome, Box<dyn Error>> {
    let columns = &config.schemas.power;
    let reference = PowerSpectrum::from_table(&Table::read_path(reference_path)?, columns)?;
    let device = PowerSpectrum::from_table(&Table::read_path(device_path)?, columns)?;
    let pair = ValidatedPair::from_spectra(reference, device, config.flux.grid_tolerance)?;
    write_spectrum_stage(&pair, config, out)
}

fn run_pair<S: FluxSolver>(
    solver: &S,
    reference: &S::Scene,
    device: &S::Scene,
    best: &BestMode,
    config: &PipelineConfig,
) -> Result<ValidatedPair, CavError> {
    let window = config.flux.window_for(best)?;
    let plan = RunPlan::new(window, config.flux.decay)?;
    PairedRun::from_plan(plan)?
        .execute(solver, reference, device, config.flux.parallel)?
        .validate(config.flux.grid_tolerance)
}

/// Runs the paired flux protocol with any solver.
pub fn purcell_with_solver<S: FluxSolver>(
    solver: &S,
    reference: &S::Scene,
    device: &S::Scene,
    best: &BestMode,
    config: &PipelineConfig,
    out: &Path,
) -> Result<SpectrumOutcome, Box<dyn Error>> {
    let pair = run_pair(solver, reference, device, best, config)?;
    write_spectrum_stage(&pair, config, out)
}

/// Output of the end-to-end simulation.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Resonance stage.
    pub resonances: ResonanceOutcome,
    /// Spectrum stage.
    pub spectrum: SpectrumOutcome,
}

/// Ring-down, resonance extraction and paired flux runs with the built-in modal solver.
///
/// Nothing is written to `out` unless every stage succeeds.
pub fn simulate(config: &PipelineConfig, out: &Path) -> Result<SimulationOutcome, Box<dyn Error>> {
    let sim = &config.simulation;
    let band = config.harminv.band();
    let source = cav_flux::SourcePulse {
        frequency: band.center,
        fwidth: band.bandwidth,
    };
    let series = sim.solver.ring_down(&sim.scene, &source, sim.record_time)?;
    let resonances = extract_stage(&series, config)?;
    let reference = sim.scene.reference();
    let pair = run_pair(&sim.solver, &reference, &sim.scene, &resonances.best, config)?;

    write_resonance_stage(&resonances, out)?;
    let columns = &config.schemas.time_series;
    let rows = series
        .times()
        .iter()
        .zip(series.values().iter())
        .map(|(&t, &v)| vec![format_sentinel_f64(t), format_sentinel_f64(v)]);
    write_csv(out.join(files::RINGDOWN), &[columns.x.as_str(), columns.y.as_str()], rows)?;
    let spectrum = write_spectrum_stage(&pair, config, out)?;
    Ok(SimulationOutcome {
        resonances,
        spectrum,
    })
}

/// Selects emitter lines from a transition table and writes `lines.json`.
pub fn lines_from_table(
    transitions_path: &Path,
    config: &PipelineConfig,
    out: &Path,
) -> Result<Vec<EmitterLine>, Box<dyn Error>> {
    let table = Table::read_path(transitions_path)?;
    let transitions = load_transitions(&table, &config.schemas.transitions)?;
    let lines = extract_lines(&transitions, &config.lines)?;
    fs::create_dir_all(out)?;
    write_json(out.join(files::LINES), &lines)?;
    Ok(lines)
}

/// Matches the lines of a transition table against an enhancement table.
///
/// All artefacts are written only once matching has succeeded.
pub fn match_from_tables(
    spectrum_path: &Path,
    transitions_path: &Path,
    config: &PipelineConfig,
    out: &Path,
) -> Result<MatchTable, Box<dyn Error>> {
    let spectrum = EnhancementSpectrum::from_table(
        &Table::read_path(spectrum_path)?,
        &config.schemas.enhancement,
    )?;
    let transitions = load_transitions(
        &Table::read_path(transitions_path)?,
        &config.schemas.transitions,
    )?;
    let lines = extract_lines(&transitions, &config.lines)?;
    let table = match_lines(&spectrum, &lines, &config.units, &config.matching)?;

    fs::create_dir_all(out)?;
    write_json(out.join(files::LINES), &lines)?;
    write_json(out.join(files::MATCHING_JSON), &table)?;
    table.write_csv(out.join(files::MATCHING_CSV))?;
    table.write_tolerance_csv(out.join(files::TOLERANCE))?;
    fs::write(out.join(files::MATCHING_TEX), table.to_latex())?;
    fs::write(out.join(files::MATCHING_TXT), table.to_text())?;
    Ok(table)
}
