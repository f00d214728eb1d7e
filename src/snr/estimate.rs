//! Cohen's d for one grid cell.
//!
//! Pipeline per cell:
//!
//! 1. synthesize the named dataset
//! 2. subtract the per-channel mean, then SysRem-detrend the residuals
//! 3. cross-correlate every frame with the template in the planet rest frame
//! 4. Cohen's d between in-transit and out-of-transit correlation values
//!
//! Frames are cross-correlated in parallel; the grid driver above this module
//! stays strictly sequential.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::{ObsParams, SnrLevel, Target};
use crate::error::AppError;
use crate::math::cohen_d;
use crate::snr::dataset::{planet_shift, shifted_template, synthesize, Dataset};
use crate::snr::sysrem::detrend;

/// Compute Cohen's d for one (dataset, SysRem setting) cell.
///
/// Deterministic for fixed inputs.
pub fn cohen_d_for_dataset(
    target: &Target,
    level: &SnrLevel,
    sysrem: u32,
    params: &ObsParams,
) -> Result<f64, AppError> {
    let dataset = synthesize(target, level, params)?;
    let ccf = frame_correlations(&dataset, sysrem as usize);

    let mut in_transit = Vec::new();
    let mut out_of_transit = Vec::new();
    for (value, &mask) in ccf.iter().zip(dataset.in_transit.iter()) {
        if mask {
            in_transit.push(*value);
        } else {
            out_of_transit.push(*value);
        }
    }

    cohen_d(&in_transit, &out_of_transit)
}

/// Detrend and cross-correlate each frame against the rest-frame template.
///
/// Each frame's template is shifted to that frame's planet velocity before
/// correlating, and negated so that deeper absorption yields a larger value.
fn frame_correlations(dataset: &Dataset, sysrem: usize) -> Vec<f64> {
    let frames = dataset.flux.nrows();
    let channels = dataset.flux.ncols();

    // Residuals: per-channel mean removed.
    let mut residuals = dataset.flux.clone();
    subtract_channel_means(&mut residuals);

    detrend(&mut residuals, sysrem);

    (0..frames)
        .into_par_iter()
        .map(|f| {
            let shifted = shifted_template(&dataset.template, planet_shift(frames, f));
            let t_mean = shifted.iter().sum::<f64>() / channels as f64;
            let weights: Vec<f64> = shifted.iter().map(|v| -(v - t_mean)).collect();
            let norm = weights
                .iter()
                .map(|w| w * w)
                .sum::<f64>()
                .sqrt()
                .max(f64::MIN_POSITIVE);

            let row = residuals.row(f);
            row.iter().zip(weights.iter()).map(|(r, w)| r * w).sum::<f64>() / norm
        })
        .collect()
}

fn subtract_channel_means(m: &mut DMatrix<f64>) {
    let frames = m.nrows();
    for j in 0..m.ncols() {
        let mean = (0..frames).map(|i| m[(i, j)]).sum::<f64>() / frames as f64;
        for i in 0..frames {
            m[(i, j)] -= mean;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(target: &Target, snr: u32) -> SnrLevel {
        SnrLevel {
            snr,
            dataset: target.dataset_name(snr),
        }
    }

    #[test]
    fn estimate_is_deterministic() {
        let target = Target::new("WASP-107", "b");
        let params = ObsParams::default();
        let a = cohen_d_for_dataset(&target, &level(&target, 100), 5, &params).unwrap();
        let b = cohen_d_for_dataset(&target, &level(&target, 100), 5, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn strong_signal_yields_positive_effect() {
        let target = Target::new("WASP-107", "b");
        let params = ObsParams::default();
        let d = cohen_d_for_dataset(&target, &level(&target, 200), 4, &params).unwrap();
        assert!(d > 0.5, "expected clear separation at SNR 200, got d={d}");
    }

    #[test]
    fn effect_is_finite_across_default_grid() {
        let target = Target::new("WASP-107", "b");
        let params = ObsParams::default();
        for snr in [50, 100, 200] {
            for sysrem in 3..=9 {
                let d =
                    cohen_d_for_dataset(&target, &level(&target, snr), sysrem, &params).unwrap();
                assert!(d.is_finite(), "d not finite for {sysrem}_{snr}");
            }
        }
    }

    #[test]
    fn channel_mean_subtraction_zeroes_columns() {
        let mut m = DMatrix::from_row_slice(2, 2, &[1.0, 4.0, 3.0, 8.0]);
        subtract_channel_means(&mut m);
        assert!((m[(0, 0)] + 1.0).abs() < 1e-12);
        assert!((m[(1, 0)] - 1.0).abs() < 1e-12);
        assert!((m[(0, 1)] + 2.0).abs() < 1e-12);
    }
}
