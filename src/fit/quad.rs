//! Quadratic effect-size fits, one per detrending setting.
//!
//! For each plotted setting we take the effect-size series over all but the
//! last configured SNR level (matching the original study driver), fit a
//! degree-2 polynomial by least squares, evaluate it on a dense grid, and
//! mark the dense-grid argmax as the fitted maximum.
//!
//! Everything here is deterministic: ties in the dense argmax resolve to the
//! lowest SNR.

use crate::domain::{EffectCache, GridConfig, PeakMark, QuadFit, SeriesFit};
use crate::error::AppError;
use crate::math::{linspace, polyfit};

/// Fit every plotted detrending setting of a study.
pub fn fit_study(
    cache: &EffectCache,
    grid: &GridConfig,
    dense_steps: usize,
) -> Result<Vec<SeriesFit>, AppError> {
    if dense_steps < 2 {
        return Err(AppError::config("Dense grid needs at least 2 steps."));
    }

    let fit_levels = grid.fit_snrs();
    if fit_levels.len() < 2 {
        return Err(AppError::data(
            "Need at least two SNR levels in the fit (three configured overall).",
        ));
    }

    let mut out = Vec::new();
    for sysrem in grid.plotted_settings() {
        let points = cache.series(sysrem, fit_levels).ok_or_else(|| {
            AppError::data(format!("Archive has no complete series for setting {sysrem}."))
        })?;
        out.push(fit_series(sysrem, points, dense_steps)?);
    }
    Ok(out)
}

/// Fit one setting's series and locate its fitted maximum.
pub fn fit_series(
    sysrem: u32,
    points: Vec<(f64, f64)>,
    dense_steps: usize,
) -> Result<SeriesFit, AppError> {
    let coeffs = polyfit(&points, 2)?;
    let fit = QuadFit {
        coeffs: [coeffs[0], coeffs[1], coeffs[2]],
    };

    let x_min = points[0].0;
    let x_max = points[points.len() - 1].0;
    let xs = linspace(x_min, x_max, dense_steps)?;
    let dense: Vec<(f64, f64)> = xs.iter().map(|&x| (x, fit.eval(x))).collect();

    let peak = dense_argmax(&dense)?;

    Ok(SeriesFit {
        sysrem,
        points,
        fit,
        dense,
        peak,
    })
}

/// First index of the maximum fitted value on the dense grid.
fn dense_argmax(dense: &[(f64, f64)]) -> Result<PeakMark, AppError> {
    let mut best: Option<(f64, f64)> = None;
    for &(x, y) in dense {
        if !y.is_finite() {
            return Err(AppError::compute("Non-finite fitted value on dense grid."));
        }
        match best {
            Some((_, by)) if y <= by => {}
            _ => best = Some((x, y)),
        }
    }
    let (snr, d_fit) = best.ok_or_else(|| AppError::data("Empty dense grid."))?;
    Ok(PeakMark { snr, d_fit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EffectCache, EffectKey, GridConfig, Target};

    #[test]
    fn fit_recovers_parabola_vertex() {
        // y = 3 - 0.001 (x - 120)^2: vertex at x=120 inside [50, 200].
        let f = |x: f64| 3.0 - 0.001 * (x - 120.0).powi(2);
        let points: Vec<(f64, f64)> = [50.0, 100.0, 150.0, 200.0]
            .iter()
            .map(|&x| (x, f(x)))
            .collect();

        let series = fit_series(6, points, 301).unwrap();
        // 301 steps over [50, 200] puts a grid point exactly on 120.
        assert!((series.peak.snr - 120.0).abs() < 1e-9);
        assert!((series.peak.d_fit - 3.0).abs() < 1e-9);
    }

    #[test]
    fn fit_is_deterministic() {
        let points = vec![(50.0, 1.1), (100.0, 1.8)];
        let a = fit_series(4, points.clone(), 100).unwrap();
        let b = fit_series(4, points, 100).unwrap();
        assert_eq!(a.fit.coeffs, b.fit.coeffs);
        assert_eq!(a.peak.snr, b.peak.snr);
        assert_eq!(a.dense, b.dense);
    }

    #[test]
    fn two_point_series_still_fits_exactly() {
        // The default grid leaves two points; the minimum-norm quadratic must
        // still pass through both.
        let points = vec![(50.0, 1.0), (100.0, 2.0)];
        let series = fit_series(4, points, 100).unwrap();
        assert!((series.fit.eval(50.0) - 1.0).abs() < 1e-6);
        assert!((series.fit.eval(100.0) - 2.0).abs() < 1e-6);
        assert_eq!(series.dense.len(), 100);
    }

    #[test]
    fn study_fit_drops_last_snr_and_skips_low_settings() {
        let target = Target::new("WASP-107", "b");
        let grid = GridConfig::for_target(target.clone(), &[50, 100, 200]);
        let mut cache = EffectCache::new(&target);
        for key in grid.keys() {
            cache.insert(key, key.sysrem as f64 + key.snr as f64 / 1000.0);
        }

        let series = fit_study(&cache, &grid, 100).unwrap();
        // Settings 4..=9, each fit on SNR 50 and 100 only.
        assert_eq!(series.len(), 6);
        assert!(series.iter().all(|s| s.sysrem >= 4));
        for s in &series {
            let xs: Vec<f64> = s.points.iter().map(|p| p.0).collect();
            assert_eq!(xs, vec![50.0, 100.0]);
        }
    }

    #[test]
    fn argmax_ties_resolve_to_lowest_snr() {
        let dense = vec![(50.0, 1.0), (75.0, 2.0), (100.0, 2.0)];
        let peak = dense_argmax(&dense).unwrap();
        assert_eq!(peak.snr, 75.0);
    }

    #[test]
    fn incomplete_archive_is_a_data_error() {
        let target = Target::new("X", "b");
        let grid = GridConfig::for_target(target.clone(), &[50, 100, 200]);
        let cache = EffectCache::new(&target);
        let err = fit_study(&cache, &grid, 100).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
