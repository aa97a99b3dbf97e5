//! Harmonic inversion of cavity ring-down signals.
//!
//! A field observable recorded after the excitation pulse is fitted with a
//! sum of damped exponentials; the poles inside the search band become
//! [`Resonance`] records ranked by quality factor. The first record is the
//! best mode used to center the flux-normalised spectrum.

pub mod extract;
pub mod modes;
mod pencil;
pub mod series;

pub use extract::{extract_resonances, harminv, HarminvOpts, SearchBand};
pub use modes::{
    compare_by_quality, quality_factor, rank_resonances, BestMode, Resonance, ResonanceSet,
};
pub use series::TimeSeries;
