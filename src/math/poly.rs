//! Polynomial least-squares fitting and evaluation.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::ols::solve_least_squares;

/// Fit a degree-`degree` polynomial to `(x, y)` points by least squares.
///
/// Returns coefficients in ascending powers (`c[0] + c[1] x + c[2] x^2 ...`).
pub fn polyfit(points: &[(f64, f64)], degree: usize) -> Result<Vec<f64>, AppError> {
    if points.is_empty() {
        return Err(AppError::data("No points to fit."));
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(AppError::compute("Non-finite value in fit input."));
    }

    let n = points.len();
    let p = degree + 1;

    // Vandermonde design matrix: row_i = [1, x_i, x_i^2, ...].
    let mut design = DMatrix::<f64>::zeros(n, p);
    let mut obs = DVector::<f64>::zeros(n);
    for (i, &(x, y)) in points.iter().enumerate() {
        let mut pow = 1.0;
        for j in 0..p {
            design[(i, j)] = pow;
            pow *= x;
        }
        obs[i] = y;
    }

    let beta = solve_least_squares(&design, &obs)
        .ok_or_else(|| AppError::compute("Polynomial fit failed: ill-conditioned system."))?;

    Ok(beta.iter().copied().collect())
}

/// Evaluate a polynomial (ascending-power coefficients) at `x`.
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    // Horner, high power first.
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// `n` linearly spaced points between `min` and `max` (inclusive).
pub fn linspace(min: f64, max: f64, n: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(AppError::config(format!(
            "Invalid range: min={min}, max={max} (must be finite and max>min)."
        )));
    }
    if n < 2 {
        return Err(AppError::config("Linspace requires at least 2 points."));
    }

    let step = (max - min) / (n as f64 - 1.0);
    Ok((0..n).map(|i| min + step * i as f64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyfit_recovers_exact_quadratic() {
        // y = 1 - 2x + 0.5x^2 on five points.
        let points: Vec<(f64, f64)> = [0.0, 1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|&x| (x, 1.0 - 2.0 * x + 0.5 * x * x))
            .collect();

        let c = polyfit(&points, 2).unwrap();
        assert!((c[0] - 1.0).abs() < 1e-9);
        assert!((c[1] + 2.0).abs() < 1e-9);
        assert!((c[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn polyfit_is_deterministic() {
        let points = vec![(50.0, 1.2), (100.0, 1.9)];
        let a = polyfit(&points, 2).unwrap();
        let b = polyfit(&points, 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn polyval_matches_direct_evaluation() {
        let c = [1.0, -2.0, 0.5];
        for &x in &[0.0, 0.5, 3.0, 10.0] {
            let direct = 1.0 - 2.0 * x + 0.5 * x * x;
            assert!((polyval(&c, x) - direct).abs() < 1e-12);
        }
    }

    #[test]
    fn linspace_includes_endpoints_and_count() {
        let v = linspace(50.0, 100.0, 100).unwrap();
        assert_eq!(v.len(), 100);
        assert!((v[0] - 50.0).abs() < 1e-12);
        assert!((v[99] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn linspace_rejects_degenerate_range() {
        assert!(linspace(1.0, 1.0, 10).is_err());
        assert!(linspace(2.0, 1.0, 10).is_err());
    }
}
