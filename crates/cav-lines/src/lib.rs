//! Emitter line extraction.
//!
//! Groups excited-state transitions by emitter and selects one
//! representative zero-phonon line per emitter through ordered pool and pick
//! rule chains.

pub mod broaden;
pub mod extract;
pub mod rules;
pub mod transition;

pub use broaden::Broadening;
pub use extract::{
    extract_lines, select_line, EmitterLine, LineMethod, LineOpts, SelectionPath, POOL_CHAIN,
};
pub use rules::{EnergyWindow, Pick, PickContext, PickRule, PoolRule};
pub use transition::{load_transitions, Transition, TransitionColumns};
