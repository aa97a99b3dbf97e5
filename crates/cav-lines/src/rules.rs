//! Ordered rule chains for line selection.
//!
//! Pool rules narrow an emitter's transitions to a candidate pool; pick rules
//! choose one line from that pool. Each rule either returns a definite result
//! or declines, and the first rule that answers wins.

use serde::{Deserialize, Serialize};

use crate::broaden::Broadening;
use crate::transition::Transition;

/// Inclusive energy window in eV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindow {
    /// Lower bound.
    pub min_ev: f64,
    /// Upper bound.
    pub max_ev: f64,
}

impl Default for EnergyWindow {
    fn default() -> Self {
        Self {
            min_ev: 1.0,
            max_ev: 4.5,
        }
    }
}

impl EnergyWindow {
    /// Whether `energy_ev` lies in the window, bounds included.
    pub fn contains(&self, energy_ev: f64) -> bool {
        energy_ev >= self.min_ev && energy_ev <= self.max_ev
    }
}

/// Rule that forms the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolRule {
    /// Transitions inside the energy window.
    InWindow,
    /// Every transition of the emitter.
    WholeGroup,
}

impl PoolRule {
    /// Candidate pool, or `None` when the rule yields nothing.
    pub fn apply<'a>(
        &self,
        group: &'a [Transition],
        window: &EnergyWindow,
    ) -> Option<Vec<&'a Transition>> {
        let pool: Vec<&Transition> = match self {
            PoolRule::InWindow => group
                .iter()
                .filter(|t| window.contains(t.energy_ev))
                .collect(),
            PoolRule::WholeGroup => group.iter().collect(),
        };
        (!pool.is_empty()).then_some(pool)
    }
}

/// Rule that picks the line from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PickRule {
    /// Lowest-energy transition brighter than the threshold.
    LowestBright,
    /// Peak of the Gaussian-broadened pool spectrum inside the window.
    BroadenedPeak,
    /// Lowest-energy transition regardless of brightness.
    Lowest,
}

/// Line chosen by a pick rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    /// Selected energy in eV.
    pub energy_ev: f64,
    /// Oscillator strength attributed to the line.
    pub strength: f64,
}

/// Inputs shared by the pick rules.
#[derive(Debug, Clone, Copy)]
pub struct PickContext<'a> {
    /// Brightness threshold (strictly greater counts as bright).
    pub threshold: f64,
    /// Energy window.
    pub window: &'a EnergyWindow,
    /// Broadening used by [`PickRule::BroadenedPeak`].
    pub broadening: &'a Broadening,
}

impl PickRule {
    /// Picks a line from `pool`, or `None` when the rule does not apply.
    pub fn apply(&self, pool: &[&Transition], ctx: &PickContext<'_>) -> Option<Pick> {
        match self {
            PickRule::LowestBright => lowest(
                pool.iter()
                    .copied()
                    .filter(|t| t.strength > ctx.threshold),
            ),
            PickRule::Lowest => lowest(pool.iter().copied()),
            PickRule::BroadenedPeak => broadened_peak(pool, ctx),
        }
    }
}

/// Lowest energy; equal energies keep the earlier transition.
fn lowest<'a, I>(candidates: I) -> Option<Pick>
where
    I: Iterator<Item = &'a Transition>,
{
    candidates
        .fold(None::<&Transition>, |best, t| match best {
            Some(b) if b.energy_ev <= t.energy_ev => Some(b),
            _ => Some(t),
        })
        .map(|t| Pick {
            energy_ev: t.energy_ev,
            strength: t.strength,
        })
}

fn broadened_peak(pool: &[&Transition], ctx: &PickContext<'_>) -> Option<Pick> {
    let owned: Vec<Transition> = pool.iter().map(|t| (*t).clone()).collect();
    let spectrum = ctx.broadening.spectrum(&owned);
    let max = spectrum.iter().copied().fold(0.0_f64, f64::max);
    if !(max > 0.0) {
        return None;
    }
    let grid = ctx.broadening.grid();
    let mut best: Option<usize> = None;
    for (idx, energy) in grid.iter().enumerate() {
        if !ctx.window.contains(*energy) {
            continue;
        }
        match best {
            Some(b) if spectrum[b] >= spectrum[idx] => {}
            _ => best = Some(idx),
        }
    }
    let best = best?;
    // a flat zero window means no broadened line reaches it
    if !(spectrum[best] > 0.0) {
        return None;
    }
    let energy_ev = grid[best];
    let strength = pool
        .iter()
        .fold(None::<&Transition>, |acc, t| match acc {
            Some(a) if (a.energy_ev - energy_ev).abs() <= (t.energy_ev - energy_ev).abs() => {
                Some(a)
            }
            _ => Some(t),
        })
        .map_or(0.0, |t| t.strength);
    Some(Pick {
        energy_ev,
        strength,
    })
}
