//! Debug bundle writer for inspecting archive contents and fitted curves.

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::app::pipeline::StudyOutput;
use crate::domain::StudyConfig;
use crate::error::AppError;

/// Write a timestamped markdown bundle with the raw archive entries and the
/// per-setting fits. Returns the path of the written file.
pub fn write_debug_bundle(output: &StudyOutput, config: &StudyConfig) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir).map_err(|e| AppError::compute(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!(
        "tsnr_debug_{}{}_{ts}.md",
        config.grid.target.star, config.grid.target.planet
    ));

    let mut file = File::create(&path)
        .map_err(|e| AppError::compute(format!("Failed to create debug file: {e}")))?;

    write_bundle(&mut file, output, config)
        .map_err(|e| AppError::compute(format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

fn write_bundle(
    file: &mut File,
    output: &StudyOutput,
    config: &StudyConfig,
) -> std::io::Result<()> {
    let grid = &config.grid;

    writeln!(file, "# tsnr debug bundle")?;
    writeln!(file, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(file, "- target: {} {}", grid.target.star, grid.target.planet)?;
    writeln!(file, "- archive: {}", config.cache_path.display())?;
    writeln!(file, "- archive_created: {}", output.cache.created.to_rfc3339())?;
    writeln!(
        file,
        "- grid: sysrem={}..={} (plots from {}), snr={:?}",
        grid.sysrem_min,
        grid.sysrem_max,
        grid.plot_min_sysrem,
        grid.levels.iter().map(|l| l.snr).collect::<Vec<_>>()
    )?;
    writeln!(
        file,
        "- obs: frames={}, channels={}, seed={}",
        config.obs.frames, config.obs.channels, config.obs.seed
    )?;

    writeln!(file, "\n## Archive entries")?;
    writeln!(file, "| key | cohen_d |")?;
    writeln!(file, "|---|---|")?;
    for (key, d) in &output.cache.entries {
        writeln!(file, "| {key} | {d:.6} |")?;
    }

    writeln!(file, "\n## Fitted curves")?;
    for s in &output.series {
        writeln!(
            file,
            "- sysrem {}: coeffs=[{:.6e}, {:.6e}, {:.6e}], peak at SNR {:.2} (d={:.4})",
            s.sysrem, s.fit.coeffs[0], s.fit.coeffs[1], s.fit.coeffs[2], s.peak.snr, s.peak.d_fit
        )?;
    }

    writeln!(file, "\n## Peaks")?;
    for row in &output.peaks {
        writeln!(
            file,
            "- sysrem {}: peak_snr={:.2}, fitted_d={:.4}, raw_max_d={:.4}",
            row.sysrem, row.peak_snr, row.peak_d, row.raw_max_d
        )?;
    }

    Ok(())
}
