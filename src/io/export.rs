//! Export study results to CSV and fitted curves to JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON carries enough metadata to re-plot without recomputing.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Utc;

use crate::domain::{EffectCache, EffectKey, FitsFile, GridConfig, SeriesFit};
use crate::error::AppError;

/// Write one row per grid cell to a CSV file.
///
/// Cells that participate in a fit also get the fitted value and residual;
/// for the rest those columns are left empty.
pub fn write_results_csv(
    path: &Path,
    cache: &EffectCache,
    grid: &GridConfig,
    series: &[SeriesFit],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "sysrem,snr,dataset,cohen_d,d_fit,residual")
        .map_err(|e| AppError::config(format!("Failed to write export CSV header: {e}")))?;

    for key in grid.keys() {
        let d = cache.get(key).ok_or_else(|| {
            AppError::data(format!("Archive is missing entry '{}'.", key.encode()))
        })?;
        let dataset = grid
            .level_for(key.snr)
            .map(|l| l.dataset.as_str())
            .unwrap_or("");

        let fitted = fitted_value(series, key);
        let (d_fit, residual) = match fitted {
            Some(y) => (format!("{y:.10}"), format!("{:.10}", d - y)),
            None => (String::new(), String::new()),
        };

        writeln!(
            file,
            "{},{},{},{:.10},{},{}",
            key.sysrem, key.snr, dataset, d, d_fit, residual
        )
        .map_err(|e| AppError::config(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the fitted curves to a self-describing JSON file.
pub fn write_fits_json(
    path: &Path,
    cache: &EffectCache,
    series: &[SeriesFit],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::config(format!("Failed to create fits JSON '{}': {e}", path.display()))
    })?;

    let out = FitsFile {
        tool: cache.tool.clone(),
        star: cache.star.clone(),
        planet: cache.planet.clone(),
        created: Utc::now(),
        series: series.to_vec(),
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::config(format!("Failed to write fits JSON: {e}")))?;

    Ok(())
}

/// Fitted value for a grid cell, if that cell was part of a fitted series.
fn fitted_value(series: &[SeriesFit], key: EffectKey) -> Option<f64> {
    let s = series.iter().find(|s| s.sysrem == key.sysrem)?;
    let x = key.snr as f64;
    s.points.iter().any(|&(px, _)| px == x).then(|| s.fit.eval(x))
}
