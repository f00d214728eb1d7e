//! Shared "study pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! archive load-or-build -> grid check -> per-setting quadratic fits -> peaks
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::collections::BTreeSet;

use crate::domain::{EffectCache, EffectKey, GridConfig, PeakRow, SeriesFit, StudyConfig, Target};
use crate::error::AppError;
use crate::io::cache::{load_or_build, CacheStatus};
use crate::snr::cohen_d_for_dataset;

/// All computed outputs of a single `tsnr run`.
#[derive(Debug, Clone)]
pub struct StudyOutput {
    pub cache: EffectCache,
    pub status: CacheStatus,
    pub series: Vec<SeriesFit>,
    pub peaks: Vec<PeakRow>,
}

/// Execute the full study pipeline and return the computed outputs.
pub fn run_study(config: &StudyConfig) -> Result<StudyOutput, AppError> {
    config.grid.validate()?;

    // 1) Load the archive, or compute every grid cell and write it.
    let grid = &config.grid;
    let (cache, status) = load_or_build(&config.cache_path, grid, config.recompute, |key| {
        let level = grid.level_for(key.snr).ok_or_else(|| {
            AppError::data(format!("No dataset configured for SNR {}.", key.snr))
        })?;
        cohen_d_for_dataset(&grid.target, level, key.sysrem, &config.obs)
    })?;

    // 2) A loaded archive must still cover the configured grid.
    cache.verify_grid(grid)?;

    // 3) Fit the per-setting quadratics and summarize the peaks.
    let series = crate::fit::fit_study(&cache, grid, config.dense_steps)?;
    let peaks = crate::report::peak_table(&series);

    Ok(StudyOutput {
        cache,
        status,
        series,
        peaks,
    })
}

/// Reconstruct a grid from an archive's own keys (for plot-only mode).
///
/// Malformed keys are a hard error: the archive is the only source of truth
/// here, so a key we cannot place would silently distort the plot.
pub fn grid_from_archive(cache: &EffectCache, plot_min: u32) -> Result<GridConfig, AppError> {
    let mut settings = BTreeSet::new();
    let mut snrs = BTreeSet::new();
    for key in cache.entries.keys() {
        let parsed = EffectKey::parse(key).ok_or_else(|| {
            AppError::config(format!("Archive contains malformed key '{key}'."))
        })?;
        settings.insert(parsed.sysrem);
        snrs.insert(parsed.snr);
    }

    let (Some(&sysrem_min), Some(&sysrem_max)) = (settings.first(), settings.last()) else {
        return Err(AppError::data("Archive is empty."));
    };

    let target = Target::new(cache.star.clone(), cache.planet.clone());
    let snrs: Vec<u32> = snrs.into_iter().collect();
    let mut grid = GridConfig::for_target(target, &snrs);
    grid.sysrem_min = sysrem_min;
    grid.sysrem_max = sysrem_max;
    grid.plot_min_sysrem = plot_min.clamp(sysrem_min, sysrem_max);
    grid.validate()?;
    Ok(grid)
}
