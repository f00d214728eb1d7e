//! Command-line parsing for the transit SNR effect-size study tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimation/fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "tsnr", version, about = "Exoplanet transit SNR effect-size study")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build or load the effect-size archive, fit curves, print and plot results.
    Run(RunArgs),
    /// Print the per-setting peak table only (useful for scripting).
    Peaks(RunArgs),
    /// Plot a previously written archive without computing anything.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying study pipeline as `tsnr run`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(RunArgs),
}

/// Common options for running and summarizing a study.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Target star.
    #[arg(long, default_value = "WASP-107")]
    pub star: String,

    /// Target planet designation.
    #[arg(long, default_value = "b")]
    pub planet: String,

    /// SNR levels of the grid; dataset names derive from these.
    #[arg(long, value_delimiter = ',', default_values_t = vec![50u32, 100, 200])]
    pub snr: Vec<u32>,

    /// Lowest SysRem iteration count to compute.
    #[arg(long, default_value_t = 3)]
    pub sysrem_min: u32,

    /// Highest SysRem iteration count to compute.
    #[arg(long, default_value_t = 9)]
    pub sysrem_max: u32,

    /// Lowest SysRem setting included in fits and plots.
    #[arg(long, default_value_t = 4)]
    pub plot_min: u32,

    /// Archive path. Defaults to `$TSNR_CACHE` (from the environment or `.env`),
    /// falling back to `cohends.json`.
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Rebuild the archive even if the file exists.
    #[arg(long)]
    pub recompute: bool,

    /// Dense evaluation points per fitted curve.
    #[arg(long, default_value_t = 100)]
    pub dense_steps: usize,

    /// Exposures per synthesized dataset.
    #[arg(long, default_value_t = 48)]
    pub frames: usize,

    /// Wavelength channels per exposure.
    #[arg(long, default_value_t = 256)]
    pub channels: usize,

    /// Base seed for dataset synthesis.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-cell results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export fitted curves (coefficients + dense grid + peaks) to JSON.
    #[arg(long = "export-fits")]
    pub export_fits: Option<PathBuf>,
}

/// Options for plotting a saved archive.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Archive file produced by `tsnr run`. Defaults like `--cache` on `run`.
    #[arg(long, value_name = "JSON")]
    pub cache: Option<PathBuf>,

    /// Lowest SysRem setting included in the plot.
    #[arg(long, default_value_t = 4)]
    pub plot_min: u32,

    /// Dense evaluation points per fitted curve.
    #[arg(long, default_value_t = 100)]
    pub dense_steps: usize,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
