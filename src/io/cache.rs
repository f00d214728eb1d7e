//! Result archive read/write with build-on-miss.
//!
//! The archive is the study's only persistent state: a flat
//! `"{sysrem}_{snr}" -> d` mapping plus self-describing metadata, stored as
//! JSON. The contract mirrors the original driver:
//!
//! - file absent: compute every grid cell (sequentially, in key order), write
//!   the archive atomically, return it
//! - file present: read it back and perform zero estimator calls
//!
//! The estimator is passed in as a closure so this layer stays independent of
//! the estimation code (and so tests can count calls). No retry, no
//! partial-failure handling: the first estimator error aborts the build and
//! nothing is written.

use std::fs::{self, File};
use std::path::Path;

use crate::domain::{EffectCache, EffectKey, GridConfig};
use crate::error::AppError;

/// Whether the archive was computed this run or read from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Built,
    Loaded,
}

/// Load the archive at `path`, or build it by calling `estimate` once per
/// grid cell and writing the result atomically.
///
/// With `recompute` set, an existing file is ignored and rebuilt.
pub fn load_or_build<F>(
    path: &Path,
    grid: &GridConfig,
    recompute: bool,
    mut estimate: F,
) -> Result<(EffectCache, CacheStatus), AppError>
where
    F: FnMut(EffectKey) -> Result<f64, AppError>,
{
    if path.exists() && !recompute {
        return Ok((read_cache(path)?, CacheStatus::Loaded));
    }

    let mut cache = EffectCache::new(&grid.target);
    for key in grid.keys() {
        let d = estimate(key)?;
        if !d.is_finite() {
            return Err(AppError::compute(format!(
                "Estimator returned a non-finite effect size for '{}'.",
                key.encode()
            )));
        }
        cache.insert(key, d);
    }

    write_cache_atomic(path, &cache)?;
    Ok((cache, CacheStatus::Built))
}

/// Read an archive file.
pub fn read_cache(path: &Path) -> Result<EffectCache, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open archive '{}': {e}", path.display())))?;
    let cache: EffectCache = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid archive '{}': {e}", path.display())))?;
    Ok(cache)
}

/// Write an archive file atomically: temp file in the same directory, then
/// rename over the target.
pub fn write_cache_atomic(path: &Path, cache: &EffectCache) -> Result<(), AppError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::config(format!("Invalid archive path '{}'.", path.display())))?;
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    let result = (|| -> Result<(), AppError> {
        let file = File::create(&tmp).map_err(|e| {
            AppError::config(format!("Failed to create archive '{}': {e}", tmp.display()))
        })?;
        serde_json::to_writer_pretty(file, cache)
            .map_err(|e| AppError::config(format!("Failed to write archive: {e}")))?;
        fs::rename(&tmp, path).map_err(|e| {
            AppError::config(format!("Failed to move archive into place: {e}"))
        })?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GridConfig, Target};

    fn test_grid() -> GridConfig {
        GridConfig::for_target(Target::new("WASP-107", "b"), &[50, 100, 200])
    }

    /// A deterministic stand-in for the real estimator.
    fn fake_d(key: EffectKey) -> f64 {
        key.sysrem as f64 + key.snr as f64 / 1000.0
    }

    #[test]
    fn build_then_load_round_trips_all_grid_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohends.json");
        let grid = test_grid();

        let (built, status) = load_or_build(&path, &grid, false, |k| Ok(fake_d(k))).unwrap();
        assert_eq!(status, CacheStatus::Built);

        let (loaded, status) = load_or_build(&path, &grid, false, |_| {
            panic!("estimator must not run when the archive exists")
        })
        .unwrap();
        assert_eq!(status, CacheStatus::Loaded);

        for key in grid.keys() {
            assert_eq!(loaded.get(key), built.get(key));
            assert_eq!(loaded.get(key), Some(fake_d(key)));
        }
    }

    #[test]
    fn existing_archive_means_zero_estimator_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohends.json");
        let grid = test_grid();

        let mut calls = 0;
        load_or_build(&path, &grid, false, |k| {
            calls += 1;
            Ok(fake_d(k))
        })
        .unwrap();
        assert_eq!(calls, grid.keys().len());

        let mut second_calls = 0;
        load_or_build(&path, &grid, false, |k| {
            second_calls += 1;
            Ok(fake_d(k))
        })
        .unwrap();
        assert_eq!(second_calls, 0);
    }

    #[test]
    fn recompute_rebuilds_over_existing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohends.json");
        let grid = test_grid();

        load_or_build(&path, &grid, false, |_| Ok(1.0)).unwrap();
        let (cache, status) = load_or_build(&path, &grid, true, |_| Ok(2.0)).unwrap();
        assert_eq!(status, CacheStatus::Built);
        assert_eq!(cache.get(EffectKey::new(3, 50)), Some(2.0));
        // The rebuilt values are what is now on disk.
        assert_eq!(read_cache(&path).unwrap().get(EffectKey::new(3, 50)), Some(2.0));
    }

    #[test]
    fn estimator_failure_aborts_build_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohends.json");
        let grid = test_grid();

        let err = load_or_build(&path, &grid, false, |k| {
            if k.sysrem >= 5 {
                Err(AppError::compute("estimator exploded"))
            } else {
                Ok(fake_d(k))
            }
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(!path.exists(), "no partial archive may be left behind");
    }

    #[test]
    fn non_finite_effect_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohends.json");
        let grid = test_grid();

        let err = load_or_build(&path, &grid, false, |_| Ok(f64::NAN)).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(!path.exists());
    }

    #[test]
    fn malformed_archive_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohends.json");
        std::fs::write(&path, "not json").unwrap();

        let err = read_cache(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_archive_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_cache(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
