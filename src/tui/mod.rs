//! Ratatui-based terminal UI.
//!
//! The TUI runs the same study pipeline as `tsnr run` and renders the fitted
//! effect-size curves as an interactive chart: one color per detrending
//! setting, raw markers, fitted quadratic, and a vertical line at each fitted
//! maximum.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Terminal,
};

use crate::app::pipeline::{run_study, StudyOutput};
use crate::domain::{SeriesFit, StudyConfig};
use crate::error::AppError;
use crate::io::cache::CacheStatus;

mod plotters_chart;

use plotters_chart::{ChartSeries, StudyPlottersChart, SERIES_COLORS};

/// Start the TUI.
pub fn run(config: StudyConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::compute(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::compute(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::compute(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: StudyConfig,
    /// Index into the fitted series list (highlighted setting).
    selected: usize,
    status: String,
    output: Option<StudyOutput>,
}

impl App {
    fn new(config: StudyConfig) -> Result<Self, AppError> {
        let mut app = Self {
            config,
            selected: 0,
            status: "Running study...".to_string(),
            output: None,
        };
        app.refresh(false)?;
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::compute(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::compute(format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::compute(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Left => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
                self.update_selection_status();
            }
            KeyCode::Right => {
                let count = self.output.as_ref().map(|o| o.series.len()).unwrap_or(0);
                if self.selected + 1 < count {
                    self.selected += 1;
                }
                self.update_selection_status();
            }
            KeyCode::Char('r') => {
                self.status = "Recomputing archive...".to_string();
                self.refresh(true)?;
            }
            KeyCode::Char('d') => {
                if let Some(output) = &self.output {
                    match crate::debug::write_debug_bundle(output, &self.config) {
                        Ok(path) => {
                            self.status = format!("Wrote debug bundle: {}", path.display());
                        }
                        Err(err) => {
                            self.status = format!("Debug write failed: {err}");
                        }
                    }
                } else {
                    self.status = "No study output available.".to_string();
                }
            }
            _ => {}
        }

        Ok(false)
    }

    fn update_selection_status(&mut self) {
        if let Some(s) = self.selected_series() {
            self.status = format!(
                "sysrem {}: peak at SNR {:.1}, fitted d {:.3}",
                s.sysrem, s.peak.snr, s.peak.d_fit
            );
        }
    }

    fn selected_series(&self) -> Option<&SeriesFit> {
        self.output.as_ref()?.series.get(self.selected)
    }

    fn refresh(&mut self, recompute: bool) -> Result<(), AppError> {
        let mut config = self.config.clone();
        config.recompute = recompute;
        let output = run_study(&config)?;
        self.status = match output.status {
            CacheStatus::Built => "Archive built.".to_string(),
            CacheStatus::Loaded => format!("Archive loaded: {}", self.config.cache_path.display()),
        };
        self.selected = self.selected.min(output.series.len().saturating_sub(1));
        self.output = Some(output);
        Ok(())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let grid = &self.config.grid;
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("tsnr", Style::default().fg(Color::Cyan)),
            Span::raw(" — transit SNR effect-size study"),
        ]));

        let snrs: Vec<u32> = grid.levels.iter().map(|l| l.snr).collect();
        lines.push(Line::from(Span::styled(
            format!(
                "target: {} {} | sysrem: {}..={} (plots from {}) | snr: {snrs:?}",
                grid.target.star,
                grid.target.planet,
                grid.sysrem_min,
                grid.sysrem_max,
                grid.plot_min_sysrem,
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(output) = &self.output {
            if let Some(best) = crate::report::best_setting(&output.peaks) {
                lines.push(Line::from(Span::styled(
                    format!(
                        "best: sysrem {} (fitted d {:.3} at SNR {:.1}) | entries: {}",
                        best.sysrem,
                        best.peak_d,
                        best.peak_snr,
                        output.cache.entries.len(),
                    ),
                    Style::default().fg(Color::Gray),
                )));
            }
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Cohen d vs SNR").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(output) = &self.output else {
            let msg = Paragraph::new("Waiting for study results...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let Some((series, x_bounds, y_bounds)) = chart_series(&output.series) else {
            return;
        };

        let widget = StudyPlottersChart {
            series: &series,
            highlight: Some(self.selected),
            x_bounds,
            y_bounds,
            x_label: "SNR",
            y_label: "Cohen d",
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = format!(
            "q quit | ←/→ select setting | r recompute | d debug bundle\n{}",
            self.status
        );
        let p = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Convert fitted series into renderable chart series plus shared bounds.
fn chart_series(series: &[SeriesFit]) -> Option<(Vec<ChartSeries>, [f64; 2], [f64; 2])> {
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

    if !(x_min.is_finite() && x_max > x_min && y_min.is_finite() && y_max > y_min) {
        return None;
    }

    let pad = (y_max - y_min) * 0.05;
    let y_bounds = [y_min - pad, y_max + pad];

    let out: Vec<ChartSeries> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (lo, hi) = s
                .dense
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
                    (lo.min(y), hi.max(y))
                });
            ChartSeries {
                label: format!("sysrem {}", s.sysrem),
                points: s.points.clone(),
                curve: s.dense.clone(),
                vline: (s.peak.snr, lo, hi),
                color: SERIES_COLORS[i % SERIES_COLORS.len()],
            }
        })
        .collect();

    Some((out, [x_min, x_max], y_bounds))
}
