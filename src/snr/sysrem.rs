//! SysRem detrending.
//!
//! SysRem removes one rank-1 systematic per iteration: it finds per-frame
//! coefficients `a` and a per-channel trend `c` minimizing
//!
//! ```text
//! Σ_ij (r_ij - a_i c_j)^2
//! ```
//!
//! by alternating least squares, then subtracts the outer product `a c^T`
//! from the residual matrix. Iteration count is the study's detrending
//! setting: too few iterations leave systematics in, too many start eating
//! the signal, which is exactly the trade-off the effect-size grid maps out.

use nalgebra::{DMatrix, DVector};

/// Maximum alternating-least-squares passes per iteration.
const MAX_INNER: usize = 20;

/// Relative convergence threshold on the coefficient vector.
const CONV_EPS: f64 = 1e-9;

/// Guard against division by a vanishing norm.
const NORM_EPS: f64 = 1e-300;

/// Summary of one detrending run.
#[derive(Debug, Clone)]
pub struct SysremSummary {
    pub iterations: usize,
    /// Residual RMS after each iteration.
    pub residual_rms: Vec<f64>,
}

/// Run `iterations` SysRem passes over `residuals` in place.
///
/// `residuals` should already have the per-channel mean removed; SysRem then
/// models what is left. With `iterations == 0` the matrix is untouched.
pub fn detrend(residuals: &mut DMatrix<f64>, iterations: usize) -> SysremSummary {
    let frames = residuals.nrows();
    let channels = residuals.ncols();

    let mut rms = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let mut a = DVector::<f64>::from_element(frames, 1.0);
        let mut c = DVector::<f64>::zeros(channels);

        for _ in 0..MAX_INNER {
            // c_j = Σ_i a_i r_ij / Σ_i a_i^2
            let a_norm2 = a.dot(&a);
            if a_norm2 <= NORM_EPS {
                break;
            }
            for j in 0..channels {
                let num: f64 = (0..frames).map(|i| a[i] * residuals[(i, j)]).sum();
                c[j] = num / a_norm2;
            }

            // a_i = Σ_j c_j r_ij / Σ_j c_j^2
            let c_norm2 = c.dot(&c);
            if c_norm2 <= NORM_EPS {
                break;
            }
            let mut max_delta: f64 = 0.0;
            let mut max_scale: f64 = 0.0;
            for i in 0..frames {
                let num: f64 = (0..channels).map(|j| c[j] * residuals[(i, j)]).sum();
                let next = num / c_norm2;
                max_delta = max_delta.max((next - a[i]).abs());
                max_scale = max_scale.max(next.abs());
                a[i] = next;
            }

            if max_delta <= CONV_EPS * max_scale.max(1.0) {
                break;
            }
        }

        // Subtract the fitted rank-1 systematic.
        for i in 0..frames {
            for j in 0..channels {
                residuals[(i, j)] -= a[i] * c[j];
            }
        }

        rms.push(matrix_rms(residuals));
    }

    SysremSummary {
        iterations,
        residual_rms: rms,
    }
}

fn matrix_rms(m: &DMatrix<f64>) -> f64 {
    let n = (m.nrows() * m.ncols()) as f64;
    (m.iter().map(|v| v * v).sum::<f64>() / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank_one(frames: usize, channels: usize) -> DMatrix<f64> {
        let a: Vec<f64> = (0..frames).map(|i| 1.0 + 0.1 * i as f64).collect();
        let c: Vec<f64> = (0..channels).map(|j| (j as f64 * 0.3).sin()).collect();
        DMatrix::from_fn(frames, channels, |i, j| a[i] * c[j])
    }

    #[test]
    fn one_iteration_removes_rank_one_structure() {
        let mut m = rank_one(20, 64);
        let before = matrix_rms(&m);
        let summary = detrend(&mut m, 1);
        assert!(before > 0.1);
        assert!(
            summary.residual_rms[0] < before * 1e-6,
            "rank-1 residual should vanish, rms={}",
            summary.residual_rms[0]
        );
    }

    #[test]
    fn residual_rms_is_non_increasing() {
        // Rank-1 structure plus deterministic pseudo-noise.
        let mut m = rank_one(20, 64);
        for i in 0..20 {
            for j in 0..64 {
                m[(i, j)] += 0.01 * ((i * 31 + j * 17) as f64).sin();
            }
        }
        let summary = detrend(&mut m, 5);
        for w in summary.residual_rms.windows(2) {
            assert!(w[1] <= w[0] + 1e-12, "rms increased: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn zero_iterations_is_identity() {
        let mut m = rank_one(8, 16);
        let orig = m.clone();
        let summary = detrend(&mut m, 0);
        assert_eq!(m, orig);
        assert!(summary.residual_rms.is_empty());
    }

    #[test]
    fn detrend_is_deterministic() {
        let mut a = rank_one(12, 32);
        let mut b = a.clone();
        detrend(&mut a, 3);
        detrend(&mut b, 3);
        assert_eq!(a, b);
    }
}
