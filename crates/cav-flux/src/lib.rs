//! Flux-normalised spectrum builder.
//!
//! Runs a reference scene and a device scene under one shared plan, checks
//! that both report the same frequency grid and divides device power by
//! reference power to obtain the Purcell enhancement spectrum.

pub mod decay;
pub mod modal;
pub mod paired;
pub mod solver;
pub mod spectrum;
pub mod window;

pub use decay::{DecayMonitor, DecayStatus, DecayStop};
pub use modal::{CavityMode, ModalScene, ModalSolver};
pub use paired::{purcell_spectrum, ExecutedPair, PairDiagnostics, PairedRun, ValidatedPair};
pub use solver::{FluxRun, FluxSolver, RunDiagnostics, RunPlan, SourcePulse};
pub use spectrum::{EnhancementSpectrum, GridTolerance, PowerSpectrum, SpectrumPeak};
pub use window::FluxWindow;
