//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds or loads the effect-size archive
//! - runs curve fitting
//! - prints reports/plots
//! - writes optional exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Command, PlotArgs, RunArgs};
use crate::domain::{GridConfig, ObsParams, StudyConfig, Target};
use crate::error::AppError;

pub mod pipeline;

/// Default archive filename, matching the original study driver.
const DEFAULT_CACHE: &str = "cohends.json";

/// Entry point for the `tsnr` binary.
pub fn run() -> Result<(), AppError> {
    // Load `.env` so `TSNR_CACHE` can live next to the project.
    dotenvy::dotenv().ok();

    // We want `tsnr` and `tsnr --star HD-189733 ...` to behave like
    // `tsnr tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args, OutputMode::Full),
        Command::Peaks(args) => handle_run(args, OutputMode::PeaksOnly),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    PeaksOnly,
}

fn handle_run(args: RunArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = study_config_from_args(&args)?;
    let run = pipeline::run_study(&config)?;

    match mode {
        OutputMode::Full => {
            println!(
                "{}",
                crate::report::format_run_summary(&config, &run.cache, run.status)
            );
        }
        OutputMode::PeaksOnly => {}
    }

    println!("{}", crate::report::format_peaks(&run.peaks));

    if mode == OutputMode::Full && config.plot {
        let plot =
            crate::plot::render_ascii_plot(&run.series, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.cache, &config.grid, &run.series)?;
    }
    if let Some(path) = &config.export_fits {
        crate::io::export::write_fits_json(path, &run.cache, &run.series)?;
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let path = resolve_cache_path(args.cache);
    let cache = crate::io::cache::read_cache(&path)?;

    // Plot-only mode reconstructs the grid from the archive itself.
    let grid = pipeline::grid_from_archive(&cache, args.plot_min)?;
    let series = crate::fit::fit_study(&cache, &grid, args.dense_steps)?;

    let plot = crate::plot::render_ascii_plot(&series, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_tui(args: RunArgs) -> Result<(), AppError> {
    let config = study_config_from_args(&args)?;
    crate::tui::run(config)
}

/// Resolve the archive path: flag, then `TSNR_CACHE`, then the default.
pub fn resolve_cache_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("TSNR_CACHE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE))
}

pub fn study_config_from_args(args: &RunArgs) -> Result<StudyConfig, AppError> {
    let target = Target::new(args.star.clone(), args.planet.clone());
    let mut grid = GridConfig::for_target(target, &args.snr);
    grid.sysrem_min = args.sysrem_min;
    grid.sysrem_max = args.sysrem_max;
    grid.plot_min_sysrem = args.plot_min;
    grid.validate()?;

    Ok(StudyConfig {
        grid,
        obs: ObsParams {
            frames: args.frames,
            channels: args.channels,
            seed: args.seed,
        },
        cache_path: resolve_cache_path(args.cache.clone()),
        recompute: args.recompute,
        dense_steps: args.dense_steps,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_fits: args.export_fits.clone(),
    })
}

/// Rewrite argv so `tsnr` defaults to `tsnr tui`.
///
/// Rules:
/// - `tsnr`                      -> `tsnr tui`
/// - `tsnr --star HD-189733 ...` -> `tsnr tui --star HD-189733 ...`
/// - `tsnr --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "peaks" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("tsnr")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&[])), argv(&["tui"]));
        assert_eq!(
            rewrite_args(argv(&["--star", "HD-189733"])),
            argv(&["tui", "--star", "HD-189733"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(rewrite_args(argv(&["run"])), argv(&["run"]));
        assert_eq!(rewrite_args(argv(&["--help"])), argv(&["--help"]));
    }
}
