//! Effect-size statistics.
//!
//! Cohen's d standardizes the separation of two samples: difference of means
//! over the pooled standard deviation. In this project the two samples are the
//! in-transit and out-of-transit cross-correlation values of one dataset.

use crate::error::AppError;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator).
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    var.sqrt()
}

/// Cohen's d between two samples.
///
/// Uses the root-mean-square of the two sample standard deviations as the
/// pooled scale: `d = (mean(a) - mean(b)) / sqrt((s_a^2 + s_b^2) / 2)`.
pub fn cohen_d(a: &[f64], b: &[f64]) -> Result<f64, AppError> {
    if a.len() < 2 || b.len() < 2 {
        return Err(AppError::data(
            "Cohen's d requires at least two values per sample.",
        ));
    }

    let s_a = sample_std(a);
    let s_b = sample_std(b);
    let pooled = ((s_a * s_a + s_b * s_b) / 2.0).sqrt();

    if !pooled.is_finite() || pooled <= 0.0 {
        return Err(AppError::compute(
            "Cohen's d undefined: zero or non-finite pooled spread.",
        ));
    }

    let d = (mean(a) - mean(b)) / pooled;
    if !d.is_finite() {
        return Err(AppError::compute("Cohen's d is non-finite."));
    }
    Ok(d)
}
