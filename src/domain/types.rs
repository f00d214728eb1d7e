//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during estimation and fitting
//! - persisted to the on-disk result archive
//! - reloaded later for plotting without recomputation

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The star/planet pair a study targets.
///
/// Dataset names derive from the target: `"{star}{planet}_SNR{snr}"`, e.g.
/// `WASP-107b_SNR100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub star: String,
    pub planet: String,
}

impl Target {
    pub fn new(star: impl Into<String>, planet: impl Into<String>) -> Self {
        Self {
            star: star.into(),
            planet: planet.into(),
        }
    }

    /// Dataset identifier for one SNR level of this target.
    pub fn dataset_name(&self, snr: u32) -> String {
        format!("{}{}_SNR{}", self.star, self.planet, snr)
    }
}

/// One named SNR level of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnrLevel {
    pub snr: u32,
    pub dataset: String,
}

/// One (detrending setting, SNR level) cell of the grid.
///
/// The string encoding `"{sysrem}_{snr}"` is the archive key format; it is the
/// only place the two coordinates are flattened into a single string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectKey {
    pub sysrem: u32,
    pub snr: u32,
}

impl EffectKey {
    pub fn new(sysrem: u32, snr: u32) -> Self {
        Self { sysrem, snr }
    }

    /// Encode as the composite archive key.
    pub fn encode(&self) -> String {
        format!("{}_{}", self.sysrem, self.snr)
    }

    /// Parse a composite archive key. Returns `None` for malformed keys.
    pub fn parse(key: &str) -> Option<Self> {
        let (sysrem, snr) = key.split_once('_')?;
        let sysrem = sysrem.parse().ok()?;
        let snr = snr.parse().ok()?;
        Some(Self { sysrem, snr })
    }
}

/// The full study grid: detrending settings crossed with SNR levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub target: Target,
    /// Lowest SysRem iteration count computed (inclusive).
    pub sysrem_min: u32,
    /// Highest SysRem iteration count computed (inclusive).
    pub sysrem_max: u32,
    /// Lowest SysRem iteration count included in plots and fits.
    ///
    /// The first computed settings tend to still carry systematics; the driver
    /// computes them for the archive but leaves them out of the curve fits.
    pub plot_min_sysrem: u32,
    /// SNR levels, ascending by `snr`.
    pub levels: Vec<SnrLevel>,
}

impl GridConfig {
    /// Build the default grid for a target: SysRem 3..=9 (plots from 4) over
    /// the given SNR values.
    pub fn for_target(target: Target, snrs: &[u32]) -> Self {
        let mut snrs: Vec<u32> = snrs.to_vec();
        snrs.sort_unstable();
        snrs.dedup();
        let levels = snrs
            .into_iter()
            .map(|snr| SnrLevel {
                snr,
                dataset: target.dataset_name(snr),
            })
            .collect();
        Self {
            target,
            sysrem_min: 3,
            sysrem_max: 9,
            plot_min_sysrem: 4,
            levels,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.sysrem_min > self.sysrem_max {
            return Err(AppError::config(format!(
                "Invalid SysRem range: {}..={}.",
                self.sysrem_min, self.sysrem_max
            )));
        }
        if !(self.sysrem_min..=self.sysrem_max).contains(&self.plot_min_sysrem) {
            return Err(AppError::config(format!(
                "Plot minimum {} outside SysRem range {}..={}.",
                self.plot_min_sysrem, self.sysrem_min, self.sysrem_max
            )));
        }
        if self.levels.len() < 3 {
            return Err(AppError::data(
                "At least three SNR levels are required (the fit drops the last one).",
            ));
        }
        if self.levels.windows(2).any(|w| w[0].snr >= w[1].snr) {
            return Err(AppError::config("SNR levels must be strictly ascending."));
        }
        Ok(())
    }

    /// All computed SysRem iteration counts, ascending.
    pub fn sysrem_settings(&self) -> impl Iterator<Item = u32> + '_ {
        self.sysrem_min..=self.sysrem_max
    }

    /// SysRem settings included in fits and plots, ascending.
    pub fn plotted_settings(&self) -> impl Iterator<Item = u32> + '_ {
        self.plot_min_sysrem..=self.sysrem_max
    }

    /// All grid cells in deterministic (sysrem-major, then snr) order.
    pub fn keys(&self) -> Vec<EffectKey> {
        let settings = self.sysrem_max.saturating_sub(self.sysrem_min) as usize + 1;
        let mut out = Vec::with_capacity(self.levels.len() * settings);
        for sysrem in self.sysrem_settings() {
            for level in &self.levels {
                out.push(EffectKey::new(sysrem, level.snr));
            }
        }
        out
    }

    pub fn level_for(&self, snr: u32) -> Option<&SnrLevel> {
        self.levels.iter().find(|l| l.snr == snr)
    }

    /// SNR values used for fitting: all but the last configured level.
    pub fn fit_snrs(&self) -> &[SnrLevel] {
        &self.levels[..self.levels.len().saturating_sub(1)]
    }
}

/// The on-disk result archive: one effect size per grid cell.
///
/// The archive is self-describing (tool, target, creation time) so a saved
/// file can be plotted later without the grid flags that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectCache {
    pub tool: String,
    pub star: String,
    pub planet: String,
    pub created: DateTime<Utc>,
    /// Flat `"{sysrem}_{snr}" -> d` mapping. `BTreeMap` keeps the file diffable.
    pub entries: BTreeMap<String, f64>,
}

impl EffectCache {
    pub fn new(target: &Target) -> Self {
        Self {
            tool: "tsnr".to_string(),
            star: target.star.clone(),
            planet: target.planet.clone(),
            created: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: EffectKey, d: f64) {
        self.entries.insert(key.encode(), d);
    }

    pub fn get(&self, key: EffectKey) -> Option<f64> {
        self.entries.get(&key.encode()).copied()
    }

    /// Effect-size series for one setting over the given SNR levels, in order.
    ///
    /// Returns `None` if any cell is missing.
    pub fn series(&self, sysrem: u32, levels: &[SnrLevel]) -> Option<Vec<(f64, f64)>> {
        levels
            .iter()
            .map(|l| self.get(EffectKey::new(sysrem, l.snr)).map(|d| (l.snr as f64, d)))
            .collect()
    }

    /// Check the grid invariant: exactly one entry per configured cell.
    pub fn verify_grid(&self, grid: &GridConfig) -> Result<(), AppError> {
        for key in grid.keys() {
            if self.get(key).is_none() {
                return Err(AppError::data(format!(
                    "Archive is missing entry '{}' for the configured grid.",
                    key.encode()
                )));
            }
        }
        Ok(())
    }
}

/// A fitted degree-2 polynomial, coefficients in ascending powers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadFit {
    pub coeffs: [f64; 3],
}

impl QuadFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs[0] + self.coeffs[1] * x + self.coeffs[2] * x * x
    }
}

/// Location of a fitted maximum on the dense grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakMark {
    /// SNR at which the fitted curve attains its dense-grid maximum.
    pub snr: f64,
    /// Fitted effect size at the maximum.
    pub d_fit: f64,
}

/// One detrending setting's fitted effect-size curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesFit {
    pub sysrem: u32,
    /// (snr, d) points the fit used — all configured levels but the last.
    pub points: Vec<(f64, f64)>,
    pub fit: QuadFit,
    /// 100-point dense evaluation over the fitted SNR range.
    pub dense: Vec<(f64, f64)>,
    pub peak: PeakMark,
}

/// Per-setting peak summary row.
#[derive(Debug, Clone)]
pub struct PeakRow {
    pub sysrem: u32,
    pub peak_snr: f64,
    pub peak_d: f64,
    /// Largest raw (unfitted) effect size in the series.
    pub raw_max_d: f64,
}

/// Synthetic observation parameters for the effect-size estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsParams {
    /// Exposures per dataset.
    pub frames: usize,
    /// Wavelength channels per exposure.
    pub channels: usize,
    /// Base seed combined with the dataset name for reproducibility.
    pub seed: u64,
}

impl Default for ObsParams {
    fn default() -> Self {
        Self {
            frames: 48,
            channels: 256,
            seed: 42,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and the environment).
#[derive(Debug, Clone)]
pub struct StudyConfig {
    pub grid: GridConfig,
    pub obs: ObsParams,

    pub cache_path: PathBuf,
    /// Rebuild the archive even if the file exists.
    pub recompute: bool,

    /// Dense evaluation points per fitted curve.
    pub dense_steps: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_fits: Option<PathBuf>,
}

/// A saved fitted-curves file (JSON export).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitsFile {
    pub tool: String,
    pub star: String,
    pub planet: String,
    pub created: DateTime<Utc>,
    pub series: Vec<SeriesFit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_key_round_trips() {
        let key = EffectKey::new(7, 200);
        assert_eq!(key.encode(), "7_200");
        assert_eq!(EffectKey::parse("7_200"), Some(key));
    }

    #[test]
    fn effect_key_rejects_malformed() {
        assert_eq!(EffectKey::parse("7"), None);
        assert_eq!(EffectKey::parse("x_200"), None);
        assert_eq!(EffectKey::parse("7_"), None);
        assert_eq!(EffectKey::parse(""), None);
    }

    #[test]
    fn default_grid_matches_wasp107() {
        let grid = GridConfig::for_target(Target::new("WASP-107", "b"), &[50, 100, 200]);
        grid.validate().unwrap();
        assert_eq!(grid.levels[0].dataset, "WASP-107b_SNR50");
        assert_eq!(grid.keys().len(), 7 * 3);
        assert_eq!(grid.plotted_settings().count(), 6);
        // The fit drops the last SNR level.
        let fit_snrs: Vec<u32> = grid.fit_snrs().iter().map(|l| l.snr).collect();
        assert_eq!(fit_snrs, vec![50, 100]);
    }

    #[test]
    fn grid_keys_are_sysrem_major() {
        let grid = GridConfig::for_target(Target::new("X", "b"), &[50, 100]);
        let keys = grid.keys();
        assert_eq!(keys[0], EffectKey::new(3, 50));
        assert_eq!(keys[1], EffectKey::new(3, 100));
        assert_eq!(keys[2], EffectKey::new(4, 50));
    }

    #[test]
    fn cache_series_requires_all_cells() {
        let target = Target::new("X", "b");
        let grid = GridConfig::for_target(target.clone(), &[50, 100]);
        let mut cache = EffectCache::new(&target);
        cache.insert(EffectKey::new(4, 50), 1.0);
        assert!(cache.series(4, &grid.levels).is_none());
        cache.insert(EffectKey::new(4, 100), 2.0);
        assert_eq!(
            cache.series(4, &grid.levels),
            Some(vec![(50.0, 1.0), (100.0, 2.0)])
        );
    }

    #[test]
    fn verify_grid_reports_missing_cell() {
        let target = Target::new("X", "b");
        let grid = GridConfig::for_target(target.clone(), &[50, 100]);
        let mut cache = EffectCache::new(&target);
        for key in grid.keys() {
            cache.insert(key, 0.5);
        }
        cache.verify_grid(&grid).unwrap();
        cache.entries.remove("5_100");
        let err = cache.verify_grid(&grid).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
