use cav_core::errors::{CavError, ErrorInfo, Stage};
use cav_core::units::LengthUnit;
use cav_flux::EnhancementSpectrum;
use serde::{Deserialize, Serialize};

/// Enhancement spectrum re-indexed by vacuum wavelength, ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavelengthSpectrum {
    wavelengths_nm: Vec<f64>,
    enhancement: Vec<f64>,
}

impl WavelengthSpectrum {
    /// Converts a frequency-indexed spectrum.
    ///
    /// Points with non-positive or non-finite frequency, or non-finite
    /// enhancement, are dropped. Negative enhancement is clipped to zero when
    /// `clip_negative` is set.
    pub fn from_frequency(
        spectrum: &EnhancementSpectrum,
        unit: &LengthUnit,
        clip_negative: bool,
    ) -> Result<Self, CavError> {
        let mut points: Vec<(f64, f64)> = spectrum
            .frequencies()
            .iter()
            .zip(spectrum.enhancement().iter())
            .filter(|(f, e)| f.is_finite() && **f > 0.0 && e.is_finite())
            .map(|(&f, &e)| {
                let value = if clip_negative && e < 0.0 { 0.0 } else { e };
                (unit.frequency_to_nm(f), value)
            })
            .filter(|(wavelength, _)| wavelength.is_finite() && *wavelength > 0.0)
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (wavelengths_nm, enhancement) = points.into_iter().unzip();
        Self::new(wavelengths_nm, enhancement)
    }

    /// Builds a view from wavelength-indexed values, sorting by wavelength.
    pub fn new(wavelengths_nm: Vec<f64>, enhancement: Vec<f64>) -> Result<Self, CavError> {
        if wavelengths_nm.len() != enhancement.len() || wavelengths_nm.is_empty() {
            return Err(CavError::InvalidInput(
                ErrorInfo::new(
                    "empty-spectrum",
                    format!(
                        "wavelength view needs matching non-empty columns, got {} / {}",
                        wavelengths_nm.len(),
                        enhancement.len()
                    ),
                )
                .with_stage(Stage::Matching)
                .with_hint("check that the enhancement table has positive frequencies"),
            ));
        }
        let mut order: Vec<usize> = (0..wavelengths_nm.len()).collect();
        order.sort_by(|&a, &b| wavelengths_nm[a].total_cmp(&wavelengths_nm[b]));
        Ok(Self {
            wavelengths_nm: order.iter().map(|&i| wavelengths_nm[i]).collect(),
            enhancement: order.iter().map(|&i| enhancement[i]).collect(),
        })
    }

    /// Wavelength grid in nm, ascending.
    pub fn wavelengths_nm(&self) -> &[f64] {
        &self.wavelengths_nm
    }

    /// Enhancement on the wavelength grid.
    pub fn enhancement(&self) -> &[f64] {
        &self.enhancement
    }

    /// Grid point nearest to `wavelength_nm`; ties go to the shorter wavelength.
    pub fn nearest(&self, wavelength_nm: f64) -> (f64, f64) {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (idx, grid) in self.wavelengths_nm.iter().enumerate() {
            let distance = (grid - wavelength_nm).abs();
            if distance < best_distance {
                best = idx;
                best_distance = distance;
            }
        }
        (self.wavelengths_nm[best], self.enhancement[best])
    }

    /// Largest enhancement with `|lambda_i - wavelength_nm| <= tolerance_nm`, or 0.
    pub fn windowed_max(&self, wavelength_nm: f64, tolerance_nm: f64) -> f64 {
        self.wavelengths_nm
            .iter()
            .zip(self.enhancement.iter())
            .filter(|(grid, _)| (*grid - wavelength_nm).abs() <= tolerance_nm)
            .map(|(_, &value)| value)
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// First global maximum in ascending wavelength order.
    pub fn peak(&self) -> (f64, f64) {
        let mut best = 0;
        for (idx, value) in self.enhancement.iter().enumerate() {
            if *value > self.enhancement[best] {
                best = idx;
            }
        }
        (self.wavelengths_nm[best], self.enhancement[best])
    }
}
