//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements, drawn in overlay order:
//! - fitted curves: `-`
//! - fitted-maximum verticals: `|`
//! - raw effect-size points: the setting digit (`4`..`9`)

use crate::domain::SeriesFit;

/// Render all fitted series into one character grid.
pub fn render_ascii_plot(series: &[SeriesFit], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_min, x_max, y_min, y_max)) = study_bounds(series) else {
        return "Plot: no fitted series.\n".to_string();
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // 1) Fit curves.
    for s in series {
        for &(x, y) in &s.dense {
            let col = map_x(x, x_min, x_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = '-';
        }
    }

    // 2) Verticals at each fitted maximum, spanning that curve's fitted range.
    for s in series {
        let col = map_x(s.peak.snr, x_min, x_max, width);
        let (lo, hi) = series_y_range(s);
        let r0 = map_y(hi, y_min, y_max, height);
        let r1 = map_y(lo, y_min, y_max, height);
        for row in grid.iter_mut().take(r1 + 1).skip(r0) {
            row[col] = '|';
        }
    }

    // 3) Raw points, marker = setting digit.
    for s in series {
        let marker = char::from_digit(s.sysrem % 10, 10).unwrap_or('o');
        for &(x, y) in &s.points {
            let col = map_x(x, x_min, x_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: snr=[{x_min:.0}, {x_max:.0}] | d=[{y_min:.3}, {y_max:.3}]\n"
    ));
    for row in &grid {
        out.push_str(&row.iter().collect::<String>());
        out.push('\n');
    }
    out.push_str(&format!(
        "{}SNR ->\n",
        " ".repeat(width.saturating_sub(7))
    ));

    let legend: Vec<String> = series
        .iter()
        .map(|s| format!("{}={}", char::from_digit(s.sysrem % 10, 10).unwrap_or('o'), s.sysrem))
        .collect();
    out.push_str(&format!("markers (sysrem): {}\n", legend.join(" ")));

    out
}

fn study_bounds(series: &[SeriesFit]) -> Option<(f64, f64, f64, f64)> {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;

    for s in series {
        for &(x, y) in s.points.iter().chain(s.dense.iter()) {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }

    (x_min.is_finite() && x_max > x_min && y_min.is_finite() && y_max.is_finite())
        .then_some((x_min, x_max, y_min, y_max.max(y_min + 1e-9)))
}

/// Fitted y-range of one series (for the vertical marker extent).
fn series_y_range(s: &SeriesFit) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &(_, y) in &s.dense {
        lo = lo.min(y);
        hi = hi.max(y);
    }
    (lo, hi)
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = (max - min).abs().max(1e-9) * frac;
    (min - pad, max + pad)
}

fn map_x(x: f64, min: f64, max: f64, width: usize) -> usize {
    let u = ((x - min) / (max - min)).clamp(0.0, 1.0);
    ((u * (width as f64 - 1.0)).round() as usize).min(width - 1)
}

/// Row 0 is the top of the grid, so y maps inverted.
fn map_y(y: f64, min: f64, max: f64, height: usize) -> usize {
    let u = ((y - min) / (max - min)).clamp(0.0, 1.0);
    let row = ((1.0 - u) * (height as f64 - 1.0)).round() as usize;
    row.min(height - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PeakMark, QuadFit};

    fn test_series() -> SeriesFit {
        let fit = QuadFit {
            coeffs: [0.0, 0.04, -0.0002],
        };
        let dense: Vec<(f64, f64)> = (0..100)
            .map(|i| {
                let x = 50.0 + i as f64 * 50.0 / 99.0;
                (x, fit.eval(x))
            })
            .collect();
        SeriesFit {
            sysrem: 4,
            points: vec![(50.0, fit.eval(50.0)), (100.0, fit.eval(100.0))],
            fit,
            dense,
            peak: PeakMark {
                snr: 100.0,
                d_fit: fit.eval(100.0),
            },
        }
    }

    #[test]
    fn plot_is_deterministic() {
        let s = vec![test_series()];
        assert_eq!(
            render_ascii_plot(&s, 60, 20),
            render_ascii_plot(&s, 60, 20)
        );
    }

    #[test]
    fn plot_contains_all_elements() {
        let text = render_ascii_plot(&[test_series()], 60, 20);
        assert!(text.starts_with("Plot: snr=[50, 100]"));
        assert!(text.contains('4'), "raw point marker missing");
        assert!(text.contains('-'), "fit curve missing");
        assert!(text.contains('|'), "fitted-maximum vertical missing");
        assert!(text.contains("markers (sysrem): 4=4"));
    }

    #[test]
    fn vertical_lands_on_peak_column() {
        let text = render_ascii_plot(&[test_series()], 60, 20);
        // Peak at the right edge of the x-range: the vertical is in the last column.
        let has_right_edge_bar = text
            .lines()
            .skip(1)
            .take(20)
            .any(|l| l.chars().last() == Some('|'));
        assert!(has_right_edge_bar, "expected vertical at right edge:\n{text}");
    }

    #[test]
    fn empty_study_renders_placeholder() {
        assert_eq!(render_ascii_plot(&[], 60, 20), "Plot: no fitted series.\n");
    }
}
