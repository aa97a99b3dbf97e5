//! Unit conversions between photon energy, wavelength and solver frequency.

use serde::{Deserialize, Serialize};

/// Photon energy times wavelength, in eV·nm (`lambda[nm] = HC_EV_NM / E[eV]`).
pub const HC_EV_NM: f64 = 1239.84193;

/// Converts a photon energy in eV to a vacuum wavelength in nm.
pub fn ev_to_nm(energy_ev: f64) -> f64 {
    HC_EV_NM / energy_ev
}

/// Converts a vacuum wavelength in nm to a photon energy in eV.
pub fn nm_to_ev(wavelength_nm: f64) -> f64 {
    HC_EV_NM / wavelength_nm
}

fn default_nm_per_unit() -> f64 {
    1000.0
}

/// Length unit of the field solver.
///
/// Solver frequencies are expressed in inverse length units with `c = 1`, so a
/// frequency `f` corresponds to a wavelength of `nm_per_unit / f` nanometres.
/// The default unit is one micrometre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthUnit {
    /// Size of one solver length unit in nanometres.
    #[serde(default = "default_nm_per_unit")]
    pub nm_per_unit: f64,
}

impl Default for LengthUnit {
    fn default() -> Self {
        Self {
            nm_per_unit: default_nm_per_unit(),
        }
    }
}

impl LengthUnit {
    /// Micrometre solver units.
    pub const MICROMETRE: LengthUnit = LengthUnit {
        nm_per_unit: 1000.0,
    };

    /// Wavelength in nm for a solver frequency.
    pub fn frequency_to_nm(&self, frequency: f64) -> f64 {
        self.nm_per_unit / frequency
    }

    /// Solver frequency for a wavelength in nm.
    pub fn nm_to_frequency(&self, wavelength_nm: f64) -> f64 {
        self.nm_per_unit / wavelength_nm
    }

    /// Solver frequency for a photon energy in eV.
    pub fn ev_to_frequency(&self, energy_ev: f64) -> f64 {
        self.nm_to_frequency(ev_to_nm(energy_ev))
    }
}
