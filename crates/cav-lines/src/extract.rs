use std::collections::BTreeMap;

use cav_core::errors::{CavError, ErrorInfo, Stage};
use cav_core::units::ev_to_nm;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::broaden::Broadening;
use crate::rules::{EnergyWindow, PickContext, PickRule, PoolRule};
use crate::transition::Transition;

fn default_threshold() -> f64 {
    1e-6
}

/// How the pick chain is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LineMethod {
    /// Lowest bright transition, then lowest transition.
    #[default]
    LowestBright,
    /// Broadened-spectrum peak, then lowest transition.
    Broadened,
}

impl LineMethod {
    /// Pick rules in evaluation order.
    pub fn pick_chain(&self) -> &'static [PickRule] {
        match self {
            LineMethod::LowestBright => &[PickRule::LowestBright, PickRule::Lowest],
            LineMethod::Broadened => &[PickRule::BroadenedPeak, PickRule::Lowest],
        }
    }
}

/// Pool rules in evaluation order.
pub const POOL_CHAIN: [PoolRule; 2] = [PoolRule::InWindow, PoolRule::WholeGroup];

/// Line-selection options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineOpts {
    /// Energy window used by the pool chain.
    #[serde(default)]
    pub window: EnergyWindow,
    /// Brightness threshold on the oscillator strength.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Pick chain selection.
    #[serde(default)]
    pub method: LineMethod,
    /// Broadening parameters for [`LineMethod::Broadened`].
    #[serde(default)]
    pub broadening: Broadening,
}

impl Default for LineOpts {
    fn default() -> Self {
        Self {
            window: EnergyWindow::default(),
            threshold: default_threshold(),
            method: LineMethod::default(),
            broadening: Broadening::default(),
        }
    }
}

/// Pool and pick rules that produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPath {
    /// Pool rule that answered.
    pub pool: PoolRule,
    /// Pick rule that answered.
    pub pick: PickRule,
}

impl SelectionPath {
    /// Whether any fallback rule was needed.
    pub fn is_fallback(&self) -> bool {
        self.pool != POOL_CHAIN[0] || self.pick == PickRule::Lowest
    }
}

/// Representative emission line of one emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterLine {
    /// Emitter identity.
    pub emitter: String,
    /// Selected energy in eV.
    pub energy_ev: f64,
    /// Oscillator strength of the selected line.
    pub strength: f64,
    /// Vacuum wavelength in nm.
    pub wavelength_nm: f64,
    /// Rules that fired.
    pub selection: SelectionPath,
}

fn empty_group(emitter: &str, message: String) -> CavError {
    CavError::EmptyEmitterGroup(
        ErrorInfo::new("empty-emitter-group", message)
            .with_stage(Stage::LineExtraction)
            .with_record(emitter),
    )
}

/// Selects one line for every distinct emitter.
///
/// Output is ordered by emitter identity.
pub fn extract_lines(
    transitions: &[Transition],
    opts: &LineOpts,
) -> Result<Vec<EmitterLine>, CavError> {
    let mut groups: BTreeMap<&str, Vec<Transition>> = BTreeMap::new();
    let mut dropped = 0usize;
    for transition in transitions {
        let group = groups.entry(transition.emitter.as_str()).or_default();
        if transition.is_finite() {
            group.push(transition.clone());
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!(dropped, "discarded non-finite transitions");
    }

    let lines = groups
        .into_iter()
        .map(|(emitter, group)| select_line(emitter, &group, opts))
        .collect::<Result<Vec<_>, _>>()?;
    info!(emitters = lines.len(), "line extraction complete");
    Ok(lines)
}

/// Runs the pool and pick chains for one emitter.
pub fn select_line(
    emitter: &str,
    group: &[Transition],
    opts: &LineOpts,
) -> Result<EmitterLine, CavError> {
    let finite: Vec<Transition> = group.iter().filter(|t| t.is_finite()).cloned().collect();
    if finite.is_empty() {
        return Err(empty_group(
            emitter,
            format!("emitter '{emitter}' has no finite transitions"),
        ));
    }

    let (pool_rule, pool) = POOL_CHAIN
        .iter()
        .find_map(|rule| rule.apply(&finite, &opts.window).map(|pool| (*rule, pool)))
        .ok_or_else(|| empty_group(emitter, format!("no pool rule matched for '{emitter}'")))?;
    if pool_rule != POOL_CHAIN[0] {
        warn!(emitter, "no transition inside the energy window; using the whole group");
    }

    let ctx = PickContext {
        threshold: opts.threshold,
        window: &opts.window,
        broadening: &opts.broadening,
    };
    let (pick_rule, pick) = opts
        .method
        .pick_chain()
        .iter()
        .find_map(|rule| rule.apply(&pool, &ctx).map(|pick| (*rule, pick)))
        .ok_or_else(|| empty_group(emitter, format!("no pick rule matched for '{emitter}'")))?;
    if pick_rule == PickRule::Lowest {
        warn!(emitter, "no bright transition in the pool; using the lowest-energy one");
    }

    debug!(
        emitter,
        energy = pick.energy_ev,
        strength = pick.strength,
        pool = ?pool_rule,
        pick = ?pick_rule,
        "selected line"
    );
    Ok(EmitterLine {
        emitter: emitter.to_string(),
        energy_ev: pick.energy_ev,
        strength: pick.strength,
        wavelength_nm: ev_to_nm(pick.energy_ev),
        selection: SelectionPath {
            pool: pool_rule,
            pick: pick_rule,
        },
    })
}
