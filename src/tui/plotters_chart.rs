//! Plotters-powered study chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - easy to extend later (legend, annotations, exportable PNG/SVG backends, etc.)
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Series palette, one color per detrending setting.
///
/// Matplotlib's default cycle, for continuity with the plots this study grew
/// out of.
pub const SERIES_COLORS: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// One detrending setting's renderable series.
///
/// All three elements share the series color, matching the original study
/// plots: raw markers, fitted curve, and a vertical line at the fitted
/// maximum.
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub curve: Vec<(f64, f64)>,
    /// Vertical marker: (x, y_low, y_high).
    pub vline: (f64, f64, f64),
    pub color: RGBColor,
}

/// A lightweight, render-only chart description.
///
/// The widget is intentionally data-driven: all series and bounds are computed
/// outside the render call. This keeps `render()` focused on drawing and makes
/// it easy to test/benchmark the data prep separately.
pub struct StudyPlottersChart<'a> {
    pub series: &'a [ChartSeries],
    /// Index of the highlighted series, drawn over the rest in white markers.
    pub highlight: Option<usize>,
    /// X bounds (SNR).
    pub x_bounds: [f64; 2],
    /// Y bounds (Cohen's d).
    pub y_bounds: [f64; 2],
    /// Axis labels (kept simple for terminal rendering).
    pub x_label: &'a str,
    pub y_label: &'a str,
}

impl<'a> Widget for StudyPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        // `plotters-ratatui-backend` draws Plotters primitives via Ratatui's
        // `Canvas` widget, which ultimately writes to the terminal buffer.
        //
        // We delegate rendering to the crate-provided widget helper to avoid
        // coupling our code to its internal backend types.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Axes + tick labels.
            //
            // We disable the mesh lines to reduce visual clutter in low-resolution
            // terminal rendering; the axes + labels are usually enough here.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| format!("{v:.2}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for s in self.series {
                // 1) Fitted curve (labeled, so it feeds the legend).
                let color = s.color;
                chart
                    .draw_series(LineSeries::new(s.curve.iter().copied(), &s.color))?
                    .label(s.label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], color));

                // 2) Vertical line at the fitted maximum.
                let (vx, vy0, vy1) = s.vline;
                chart.draw_series(LineSeries::new([(vx, vy0), (vx, vy1)], &s.color))?;

                // 3) Raw points.
                //
                // We intentionally avoid `Circle` markers here. The underlying
                // `plotters-ratatui-backend` currently maps circle radii incorrectly
                // (pixel radius -> normalized canvas units), producing huge circles.
                //
                // A colored `Pixel` gives a clean "dot" marker that looks good in
                // terminals.
                chart.draw_series(s.points.iter().map(|&(x, y)| Pixel::new((x, y), s.color)))?;
            }

            // Highlighted series markers drawn last, in white, so the selected
            // setting stays visible when curves overlap.
            if let Some(idx) = self.highlight {
                if let Some(s) = self.series.get(idx) {
                    chart.draw_series(s.points.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;
                }
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(BLACK.mix(0.6))
                .border_style(&WHITE)
                .label_font(("sans-serif", 10).into_font().color(&WHITE))
                .draw()?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
