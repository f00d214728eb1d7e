//! Least squares solver.
//!
//! The polynomial fits in this project are linear in their coefficients, so
//! every fit reduces to one small least-squares solve against a Vandermonde
//! design matrix.
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly whether the design
//!   matrix is tall (more points than coefficients) or short (the default
//!   two-point series against three quadratic coefficients). In the
//!   underdetermined case SVD yields the minimum-norm solution, which keeps
//!   the fit deterministic.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Coefficient counts are tiny (3 columns), so SVD performance is a non-issue.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails. Vandermonde
    // columns over a narrow SNR range can be nearly collinear.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_handles_underdetermined_system() {
        // Two observations, three unknowns: minimum-norm solution, still exact
        // on the observed points.
        let x = DMatrix::from_row_slice(2, 3, &[1.0, 50.0, 2500.0, 1.0, 100.0, 10000.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        let fit0 = beta[0] + beta[1] * 50.0 + beta[2] * 2500.0;
        let fit1 = beta[0] + beta[1] * 100.0 + beta[2] * 10000.0;
        assert!((fit0 - 1.0).abs() < 1e-6);
        assert!((fit1 - 2.0).abs() < 1e-6);
    }
}
