//! Reporting utilities: peak tables and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{EffectCache, PeakRow, SeriesFit, StudyConfig};
use crate::io::cache::CacheStatus;

/// Per-setting peak summary, in ascending setting order.
pub fn peak_table(series: &[SeriesFit]) -> Vec<PeakRow> {
    series
        .iter()
        .map(|s| PeakRow {
            sysrem: s.sysrem,
            peak_snr: s.peak.snr,
            peak_d: s.peak.d_fit,
            raw_max_d: s
                .points
                .iter()
                .map(|&(_, d)| d)
                .fold(f64::NEG_INFINITY, f64::max),
        })
        .collect()
}

/// Format the full run summary (target + grid + archive status).
pub fn format_run_summary(
    config: &StudyConfig,
    cache: &EffectCache,
    status: CacheStatus,
) -> String {
    let grid = &config.grid;
    let mut out = String::new();

    out.push_str("=== tsnr - Transit SNR effect-size study ===\n");
    out.push_str(&format!("Target: {} {}\n", grid.target.star, grid.target.planet));
    out.push_str(&format!(
        "Grid: sysrem={}..={} (plots from {}) | snr={:?}\n",
        grid.sysrem_min,
        grid.sysrem_max,
        grid.plot_min_sysrem,
        grid.levels.iter().map(|l| l.snr).collect::<Vec<_>>(),
    ));
    out.push_str(&format!(
        "Archive: {} ({}) | entries={} | created={}\n",
        config.cache_path.display(),
        match status {
            CacheStatus::Built => "built this run",
            CacheStatus::Loaded => "loaded from disk",
        },
        cache.entries.len(),
        cache.created.format("%Y-%m-%d %H:%M:%S UTC"),
    ));

    out
}

/// Format the per-setting peak table.
pub fn format_peaks(rows: &[PeakRow]) -> String {
    let mut out = String::new();
    out.push_str("Fitted maxima per detrending setting:\n");
    out.push_str("  sysrem | peak SNR | fitted d | raw max d\n");
    for row in rows {
        out.push_str(&format!(
            "  {:>6} | {:>8.1} | {:>8.4} | {:>9.4}\n",
            row.sysrem, row.peak_snr, row.peak_d, row.raw_max_d
        ));
    }
    out
}

/// The setting whose fitted maximum is highest (ties: lowest setting).
pub fn best_setting(rows: &[PeakRow]) -> Option<&PeakRow> {
    rows.iter().reduce(|best, row| {
        if row.peak_d > best.peak_d {
            row
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PeakMark, QuadFit};

    fn series(sysrem: u32, peak_d: f64) -> SeriesFit {
        SeriesFit {
            sysrem,
            points: vec![(50.0, peak_d - 0.2), (100.0, peak_d - 0.1)],
            fit: QuadFit { coeffs: [0.0, 0.0, 0.0] },
            dense: vec![(50.0, 0.0)],
            peak: PeakMark { snr: 75.0, d_fit: peak_d },
        }
    }

    #[test]
    fn peak_table_tracks_raw_maximum() {
        let rows = peak_table(&[series(4, 2.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sysrem, 4);
        assert!((rows[0].raw_max_d - 1.9).abs() < 1e-12);
    }

    #[test]
    fn best_setting_prefers_highest_fitted_peak() {
        let rows = peak_table(&[series(4, 1.0), series(5, 3.0), series(6, 2.0)]);
        assert_eq!(best_setting(&rows).unwrap().sysrem, 5);
    }

    #[test]
    fn best_setting_ties_resolve_to_lowest_setting() {
        let rows = peak_table(&[series(4, 2.0), series(5, 2.0)]);
        assert_eq!(best_setting(&rows).unwrap().sysrem, 4);
    }

    #[test]
    fn peak_format_lists_every_setting() {
        let rows = peak_table(&[series(4, 1.0), series(5, 2.0)]);
        let text = format_peaks(&rows);
        assert!(text.contains("sysrem"));
        assert!(text.lines().count() >= 4);
    }
}
