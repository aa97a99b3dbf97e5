//! Gaussian-broadened stick spectra.
//!
//! Oscillator strengths are deposited on the nearest point of a uniform
//! energy grid and smoothed with a truncated Gaussian kernel. Edges use
//! half-sample reflection (`d c b a | a b c d | d c b a`).

use serde::{Deserialize, Serialize};

use crate::transition::Transition;

const TRUNCATE: f64 = 4.0;

fn default_sigma() -> f64 {
    0.10
}

fn default_min() -> f64 {
    0.5
}

fn default_max() -> f64 {
    6.0
}

fn default_points() -> usize {
    3000
}

/// Energy grid and line width of the broadened spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Broadening {
    /// Gaussian standard deviation in eV.
    #[serde(default = "default_sigma")]
    pub sigma_ev: f64,
    /// Lowest grid energy in eV.
    #[serde(default = "default_min")]
    pub min_ev: f64,
    /// Highest grid energy in eV.
    #[serde(default = "default_max")]
    pub max_ev: f64,
    /// Number of grid points.
    #[serde(default = "default_points")]
    pub points: usize,
}

impl Default for Broadening {
    fn default() -> Self {
        Self {
            sigma_ev: default_sigma(),
            min_ev: default_min(),
            max_ev: default_max(),
            points: default_points(),
        }
    }
}

impl Broadening {
    fn step(&self) -> f64 {
        (self.max_ev - self.min_ev) / (self.points - 1) as f64
    }

    /// Grid energies, endpoints included.
    pub fn grid(&self) -> Vec<f64> {
        if self.points < 2 {
            return vec![self.min_ev; self.points];
        }
        let step = self.step();
        let mut grid: Vec<f64> = (0..self.points)
            .map(|i| self.min_ev + i as f64 * step)
            .collect();
        if let Some(last) = grid.last_mut() {
            *last = self.max_ev;
        }
        grid
    }

    /// Smoothed spectrum of `transitions` on [`Broadening::grid`].
    pub fn spectrum(&self, transitions: &[Transition]) -> Vec<f64> {
        let grid = self.grid();
        let mut sticks = vec![0.0; grid.len()];
        for transition in transitions {
            if let Some(idx) = nearest_index(&grid, transition.energy_ev) {
                sticks[idx] += transition.strength;
            }
        }
        if grid.len() < 2 {
            return sticks;
        }
        gaussian_filter(&sticks, self.sigma_ev / self.step())
    }
}

/// Index of the grid point closest to `x`; ties go to the lower index.
fn nearest_index(grid: &[f64], x: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, g) in grid.iter().enumerate() {
        let distance = (g - x).abs();
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((idx, distance)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn reflect(mut idx: isize, len: usize) -> usize {
    let n = len as isize;
    loop {
        if idx < 0 {
            idx = -idx - 1;
        } else if idx >= n {
            idx = 2 * n - idx - 1;
        } else {
            return idx as usize;
        }
    }
}

fn gaussian_filter(input: &[f64], sigma: f64) -> Vec<f64> {
    if !(sigma > 0.0) || input.is_empty() {
        return input.to_vec();
    }
    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= norm);

    let len = input.len();
    (0..len as isize)
        .map(|i| {
            kernel
                .iter()
                .zip(-radius..=radius)
                .map(|(w, k)| w * input[reflect(i + k, len)])
                .sum()
        })
        .collect()
}
