use std::path::Path;

use cav_core::errors::{CavError, ErrorInfo, Stage};
use cav_core::floats::format_sentinel_f64;
use cav_core::table::{write_csv, Table, XyColumns};
use cav_core::units::LengthUnit;
use serde::{Deserialize, Serialize};

fn spectrum_error(code: &str, message: impl Into<String>) -> CavError {
    CavError::InvalidInput(ErrorInfo::new(code, message).with_stage(Stage::SpectrumBuild))
}

fn default_rtol() -> f64 {
    1e-5
}

fn default_atol() -> f64 {
    1e-8
}

/// Power spectrum produced by one flux run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    frequencies: Vec<f64>,
    power: Vec<f64>,
}

impl PowerSpectrum {
    /// Pairs a frequency grid with the power measured on it.
    pub fn new(frequencies: Vec<f64>, power: Vec<f64>) -> Result<Self, CavError> {
        check_lengths(&frequencies, &power)?;
        Ok(Self { frequencies, power })
    }

    /// Loads a spectrum from a table with the declared columns.
    pub fn from_table(table: &Table, columns: &XyColumns) -> Result<Self, CavError> {
        let (frequencies, power) = columns.read(table)?;
        Self::new(frequencies, power)
    }

    /// Frequency grid.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Power values.
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the spectrum has no grid points.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Writes the spectrum as a two-column CSV table.
    pub fn write_csv(&self, path: impl AsRef<Path>, columns: &XyColumns) -> Result<(), CavError> {
        write_xy(path, columns, &self.frequencies, &self.power)
    }
}

/// Position and height of the largest enhancement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPeak {
    /// Grid index of the peak.
    pub index: usize,
    /// Peak frequency.
    pub frequency: f64,
    /// Peak wavelength in nm.
    pub wavelength_nm: f64,
    /// Enhancement at the peak.
    pub enhancement: f64,
}

/// Device power normalised by reference power on a shared grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementSpectrum {
    frequencies: Vec<f64>,
    enhancement: Vec<f64>,
}

impl EnhancementSpectrum {
    /// Wraps precomputed enhancement values.
    pub fn new(frequencies: Vec<f64>, enhancement: Vec<f64>) -> Result<Self, CavError> {
        check_lengths(&frequencies, &enhancement)?;
        Ok(Self {
            frequencies,
            enhancement,
        })
    }

    /// Loads an enhancement table with the declared columns.
    pub fn from_table(table: &Table, columns: &XyColumns) -> Result<Self, CavError> {
        let (frequencies, enhancement) = columns.read(table)?;
        Self::new(frequencies, enhancement)
    }

    /// Divides device power by reference power point by point.
    ///
    /// Zero or negative reference power yields exactly zero. Callers are
    /// expected to have checked that both grids agree.
    pub(crate) fn divide(reference: &PowerSpectrum, device: &PowerSpectrum) -> Self {
        let enhancement = reference
            .power
            .iter()
            .zip(device.power.iter())
            .map(|(&r, &d)| if r > 0.0 { d / r } else { 0.0 })
            .collect();
        Self {
            frequencies: reference.frequencies.clone(),
            enhancement,
        }
    }

    /// Frequency grid.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Enhancement values.
    pub fn enhancement(&self) -> &[f64] {
        &self.enhancement
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the spectrum has no grid points.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Grid point holding the largest enhancement.
    ///
    /// Ties resolve to the shortest wavelength (highest frequency), the same
    /// point the wavelength view of the spectrum reports as its peak.
    /// Non-finite values and non-positive frequencies are skipped.
    pub fn peak(&self, unit: &LengthUnit) -> Option<SpectrumPeak> {
        let mut best: Option<usize> = None;
        for (idx, (&frequency, &value)) in self
            .frequencies
            .iter()
            .zip(self.enhancement.iter())
            .enumerate()
        {
            if !value.is_finite() || !(frequency > 0.0) {
                continue;
            }
            let better = match best {
                None => true,
                Some(b) => {
                    value > self.enhancement[b]
                        || (value == self.enhancement[b] && frequency > self.frequencies[b])
                }
            };
            if better {
                best = Some(idx);
            }
        }
        best.map(|index| SpectrumPeak {
            index,
            frequency: self.frequencies[index],
            wavelength_nm: unit.frequency_to_nm(self.frequencies[index]),
            enhancement: self.enhancement[index],
        })
    }

    /// Writes the spectrum as a two-column CSV table.
    pub fn write_csv(&self, path: impl AsRef<Path>, columns: &XyColumns) -> Result<(), CavError> {
        write_xy(path, columns, &self.frequencies, &self.enhancement)
    }
}

/// Elementwise closeness test `|a - b| <= atol + rtol * |b|` for grids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridTolerance {
    /// Relative tolerance.
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    /// Absolute tolerance.
    #[serde(default = "default_atol")]
    pub atol: f64,
}

impl Default for GridTolerance {
    fn default() -> Self {
        Self {
            rtol: default_rtol(),
            atol: default_atol(),
        }
    }
}

impl GridTolerance {
    /// Reports the first disagreement between two grids as `GridMismatch`.
    pub fn check(&self, reference: &[f64], device: &[f64]) -> Result<(), CavError> {
        if reference.len() != device.len() {
            return Err(CavError::GridMismatch(
                ErrorInfo::new(
                    "grid-length",
                    format!(
                        "reference grid has {} points but device grid has {}",
                        reference.len(),
                        device.len()
                    ),
                )
                .with_stage(Stage::SpectrumBuild)
                .with_context("reference_points", reference.len().to_string())
                .with_context("device_points", device.len().to_string()),
            ));
        }
        let mismatch = reference
            .iter()
            .zip(device.iter())
            .position(|(&a, &b)| !((a - b).abs() <= self.atol + self.rtol * b.abs()));
        if let Some(idx) = mismatch {
            return Err(CavError::GridMismatch(
                ErrorInfo::new(
                    "grid-values",
                    format!(
                        "grids differ at point {idx}: reference {} vs device {}",
                        reference[idx], device[idx]
                    ),
                )
                .with_stage(Stage::SpectrumBuild)
                .with_record(format!("point {idx}"))
                .with_hint("configure both runs from one shared frequency window"),
            ));
        }
        Ok(())
    }
}

fn check_lengths(frequencies: &[f64], values: &[f64]) -> Result<(), CavError> {
    if frequencies.len() != values.len() {
        return Err(spectrum_error(
            "length-mismatch",
            format!(
                "spectrum has {} frequencies but {} values",
                frequencies.len(),
                values.len()
            ),
        ));
    }
    if frequencies.is_empty() {
        return Err(spectrum_error("empty-spectrum", "spectrum has no grid points"));
    }
    Ok(())
}

fn write_xy(
    path: impl AsRef<Path>,
    columns: &XyColumns,
    xs: &[f64],
    ys: &[f64],
) -> Result<(), CavError> {
    let rows = xs
        .iter()
        .zip(ys.iter())
        .map(|(&x, &y)| vec![format_sentinel_f64(x), format_sentinel_f64(y)]);
    write_csv(path, &[columns.x.as_str(), columns.y.as_str()], rows)
}
