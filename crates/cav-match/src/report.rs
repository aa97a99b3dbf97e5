use std::cmp::Ordering;

use cav_core::errors::CavError;
use cav_core::hash::stable_hash_string;
use cav_core::provenance::RunProvenance;
use cav_core::units::LengthUnit;
use cav_flux::EnhancementSpectrum;
use cav_lines::EmitterLine;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::record::{match_line, MatchOpts, MatchRecord};
use crate::wavelength::WavelengthSpectrum;

/// Global maximum of the enhancement spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakSummary {
    /// Peak wavelength in nm.
    pub wavelength_nm: f64,
    /// Peak enhancement.
    pub enhancement: f64,
}

/// Matching table with provenance and a content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTable {
    /// Hash over peak, records and provenance.
    pub analysis_hash: String,
    /// Spectrum peak used for detuning.
    pub peak: PeakSummary,
    /// Records sorted by detuning, then emitter.
    pub records: Vec<MatchRecord>,
    /// Producer metadata.
    pub provenance: RunProvenance,
}

/// Orders records by ascending detuning, ties by emitter identity.
pub fn compare_records(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    a.detuning_nm
        .total_cmp(&b.detuning_nm)
        .then_with(|| a.emitter.cmp(&b.emitter))
}

/// Matches every emitter line against the enhancement spectrum.
pub fn match_lines(
    spectrum: &EnhancementSpectrum,
    lines: &[EmitterLine],
    unit: &LengthUnit,
    opts: &MatchOpts,
) -> Result<MatchTable, CavError> {
    let view = WavelengthSpectrum::from_frequency(spectrum, unit, opts.clip_negative)?;
    let (peak_nm, peak_value) = view.peak();
    debug!(peak_nm, peak_value, points = view.wavelengths_nm().len(), "wavelength view ready");

    let mut records: Vec<MatchRecord> = lines
        .par_iter()
        .map(|line| match_line(line, &view, peak_nm, opts))
        .collect();
    records.sort_by(compare_records);

    let provenance = RunProvenance::new(env!("CARGO_PKG_VERSION"), stable_hash_string(opts)?)
        .with_input("spectrum", stable_hash_string(spectrum)?)
        .with_input("lines", stable_hash_string(&lines)?)
        .with_input("unit", stable_hash_string(unit)?);
    let peak = PeakSummary {
        wavelength_nm: peak_nm,
        enhancement: peak_value,
    };
    let analysis_hash = stable_hash_string(&(&peak, &records, &provenance))?;
    info!(
        emitters = records.len(),
        in_window = records.iter().filter(|r| r.in_window).count(),
        "matching complete"
    );
    Ok(MatchTable {
        analysis_hash,
        peak,
        records,
        provenance,
    })
}

/// One point of the detuning-vs-enhancement tolerance relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TolerancePoint {
    /// Emitter identity.
    pub emitter: String,
    /// Absolute detuning from the peak in nm.
    pub detuning_nm: f64,
    /// Enhancement at the nearest grid point.
    pub enhancement: f64,
    /// Windowed enhancement.
    pub windowed_enhancement: f64,
}

impl MatchTable {
    /// Detuning-vs-enhancement pairs in table order.
    pub fn tolerance_curve(&self) -> Vec<TolerancePoint> {
        self.records
            .iter()
            .map(|record| TolerancePoint {
                emitter: record.emitter.clone(),
                detuning_nm: record.detuning_nm,
                enhancement: record.enhancement,
                windowed_enhancement: record.windowed_enhancement,
            })
            .collect()
    }

    /// Records inside the acceptance window.
    pub fn accepted(&self) -> impl Iterator<Item = &MatchRecord> {
        self.records.iter().filter(|record| record.in_window)
    }
}
