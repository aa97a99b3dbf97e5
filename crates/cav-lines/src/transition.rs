use cav_core::errors::CavError;
use cav_core::table::Table;
use cav_core::units::ev_to_nm;
use serde::{Deserialize, Serialize};

fn default_emitter_column() -> String {
    "Molecule".to_string()
}

fn default_energy_column() -> String {
    "Energy(eV)".to_string()
}

fn default_strength_column() -> String {
    "Osc".to_string()
}

/// One excited-state transition of an emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Emitter identity.
    pub emitter: String,
    /// Transition energy in eV.
    pub energy_ev: f64,
    /// Oscillator strength.
    pub strength: f64,
}

impl Transition {
    /// Creates a transition record.
    pub fn new(emitter: impl Into<String>, energy_ev: f64, strength: f64) -> Self {
        Self {
            emitter: emitter.into(),
            energy_ev,
            strength,
        }
    }

    /// Whether both numeric fields are finite.
    pub fn is_finite(&self) -> bool {
        self.energy_ev.is_finite() && self.strength.is_finite()
    }

    /// Vacuum wavelength of the transition in nm.
    pub fn wavelength_nm(&self) -> f64 {
        ev_to_nm(self.energy_ev)
    }
}

/// Column names of a transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionColumns {
    /// Emitter identity column.
    #[serde(default = "default_emitter_column")]
    pub emitter: String,
    /// Energy column (eV).
    #[serde(default = "default_energy_column")]
    pub energy: String,
    /// Oscillator-strength column.
    #[serde(default = "default_strength_column")]
    pub strength: String,
}

impl Default for TransitionColumns {
    fn default() -> Self {
        Self {
            emitter: default_emitter_column(),
            energy: default_energy_column(),
            strength: default_strength_column(),
        }
    }
}

/// Reads every transition from a table with the declared columns.
///
/// `inf` and `nan` cells are kept; they are discarded during extraction.
pub fn load_transitions(
    table: &Table,
    columns: &TransitionColumns,
) -> Result<Vec<Transition>, CavError> {
    let emitters = table.text_column(&columns.emitter)?;
    let energies = table.numeric_column(&columns.energy)?;
    let strengths = table.numeric_column(&columns.strength)?;
    Ok(emitters
        .into_iter()
        .zip(energies)
        .zip(strengths)
        .map(|((emitter, energy_ev), strength)| Transition {
            emitter,
            energy_ev,
            strength,
        })
        .collect())
}
