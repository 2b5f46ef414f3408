//! Command-line parsing for the lattice post-processing tool.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the pipeline/math code. Each subcommand
//! corresponds to one reference plot macro; the paths those macros
//! hardcoded are flags with the same values as defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "lpost",
    version,
    about = "Plot and fit lattice Monte Carlo post-processing output"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands (one per experiment).
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plot 1D path-integral energy estimators with the exact asymptote.
    Propagator(PropagatorArgs),
    /// Fit and plot the quark potential from R×T Wilson loops.
    Potential(PotentialArgs),
    /// Fit and plot the Vegas harmonic-oscillator propagator.
    Vegas(VegasArgs),
}

/// Options shared by every experiment.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Settings header to read parameters from.
    #[arg(long, default_value = "SETTINGS.h")]
    pub settings: PathBuf,

    /// Data table path (default depends on the experiment).
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Output PNG path (default depends on the experiment).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Options shared by the fitting experiments.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Number of samples used to draw the fitted overlay curve.
    #[arg(long, default_value_t = 500)]
    pub curve_samples: usize,

    /// On fit failure, warn and plot the raw data without an overlay
    /// instead of aborting.
    #[arg(long)]
    pub allow_fit_failure: bool,

    /// Iteration budget for the optimizer.
    #[arg(long)]
    pub max_iters: Option<usize>,

    /// Write the fit report (parameters + diagnostics) as JSON.
    #[arg(long)]
    pub export_fit: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct PropagatorArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PotentialArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub fit: FitArgs,

    /// Maximum r/a value: only the first r-max rows enter the fit.
    #[arg(long, default_value_t = 3)]
    pub r_max: usize,
}

#[derive(Debug, Args, Clone)]
pub struct VegasArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub fit: FitArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_potential_with_defaults() {
        let cli = Cli::try_parse_from(["lpost", "potential"]).unwrap();
        match cli.command {
            Command::Potential(args) => {
                assert_eq!(args.r_max, 3);
                assert_eq!(args.common.settings, PathBuf::from("SETTINGS.h"));
                assert_eq!(args.fit.curve_samples, 500);
                assert!(!args.fit.allow_fit_failure);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_vegas_overrides() {
        let cli = Cli::try_parse_from([
            "lpost",
            "vegas",
            "--settings",
            "exp/SETTINGS.h",
            "--data",
            "exp/output_file.dat",
            "--out",
            "out.png",
            "--allow-fit-failure",
        ])
        .unwrap();
        match cli.command {
            Command::Vegas(args) => {
                assert_eq!(args.common.data, Some(PathBuf::from("exp/output_file.dat")));
                assert!(args.fit.allow_fit_failure);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
