//! Matrix-pencil estimation of signal poles.
//!
//! A uniformly sampled signal `y[n] = sum_k a_k z_k^n` yields a Hankel matrix
//! whose dominant right singular subspace is shift-invariant; the poles `z_k`
//! are the eigenvalues of the pencil formed by the two shifted subspaces.

use cav_core::errors::{CavError, ErrorInfo, Stage};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

fn pencil_error(code: &str, message: impl Into<String>) -> CavError {
    CavError::DidNotConverge(
        ErrorInfo::new(code, message).with_stage(Stage::ResonanceExtraction),
    )
}

const PINV_EPS: f64 = 1e-12;

/// Poles and amplitudes of the fitted exponential model.
#[derive(Debug, Clone)]
pub(crate) struct PencilFit {
    pub poles: Vec<Complex64>,
    pub amplitudes: Vec<Complex64>,
    pub residual: f64,
}

impl PencilFit {
    fn empty() -> Self {
        Self {
            poles: Vec::new(),
            amplitudes: Vec::new(),
            residual: 0.0,
        }
    }

    pub fn order(&self) -> usize {
        self.poles.len()
    }
}

/// Fits `samples` with at most `max_order` damped exponentials.
///
/// Singular values below `threshold * s_max` are treated as noise.
pub(crate) fn matrix_pencil(
    samples: &[f64],
    max_order: usize,
    threshold: f64,
) -> Result<PencilFit, CavError> {
    let n = samples.len();
    let l = (n / 3).max(2);
    let rows = n - l;
    let cols = l + 1;

    let hankel = DMatrix::from_fn(rows, cols, |i, j| samples[i + j]);
    let svd = hankel.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| pencil_error("svd-failed", "right singular vectors unavailable"))?;
    let singular = svd.singular_values;

    let mut ranked: Vec<usize> = (0..singular.len()).collect();
    ranked.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));
    let s_max = singular[ranked[0]];
    if !(s_max > 0.0) {
        return Ok(PencilFit::empty());
    }
    let order = ranked
        .iter()
        .take_while(|&&k| singular[k] > threshold * s_max)
        .count()
        .min(max_order)
        .min(l);
    if order == 0 {
        return Ok(PencilFit::empty());
    }

    let v = DMatrix::from_fn(cols, order, |i, k| v_t[(ranked[k], i)]);
    let v1 = v.rows(0, l).into_owned();
    let v2 = v.rows(1, l).into_owned();
    let pinv = v1
        .pseudo_inverse(PINV_EPS)
        .map_err(|err| pencil_error("pseudo-inverse", err))?;
    let pencil = pinv * v2;
    let poles: Vec<Complex64> = pencil.complex_eigenvalues().iter().copied().collect();

    let (amplitudes, residual) = fit_amplitudes(samples, &poles)?;
    Ok(PencilFit {
        poles,
        amplitudes,
        residual,
    })
}

/// Least-squares amplitudes for fixed poles and the relative fit residual.
fn fit_amplitudes(
    samples: &[f64],
    poles: &[Complex64],
) -> Result<(Vec<Complex64>, f64), CavError> {
    let n = samples.len();
    let vandermonde = DMatrix::from_fn(n, poles.len(), |t, k| poles[k].powu(t as u32));
    let target = DVector::from_iterator(n, samples.iter().map(|&y| Complex64::new(y, 0.0)));
    let svd = vandermonde.clone().svd(true, true);
    let amplitudes = svd
        .solve(&target, PINV_EPS)
        .map_err(|err| pencil_error("amplitude-solve", err))?;

    let model = vandermonde * &amplitudes;
    let err_norm = (model - &target).norm();
    let signal_norm = target.norm();
    let residual = if signal_norm > 0.0 {
        err_norm / signal_norm
    } else {
        0.0
    };
    Ok((amplitudes.iter().copied().collect(), residual))
}
