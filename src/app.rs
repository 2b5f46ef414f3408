//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main"
//! that:
//! - parses CLI arguments into an `ExperimentConfig`
//! - runs the pipeline
//! - prints the diagnostic table / fit summary / warnings
//! - writes the optional fit export

use clap::Parser;

use crate::cli::{Cli, Command, CommonArgs, FitArgs};
use crate::domain::{ExperimentConfig, ExperimentKind};
use crate::error::PostError;

pub mod pipeline;

/// Entry point for the `lpost` binary.
pub fn run() -> Result<(), PostError> {
    let cli = Cli::parse();

    let config = match cli.command {
        Command::Propagator(args) => {
            experiment_config(ExperimentKind::Propagator, &args.common, None, 3)
        }
        Command::Potential(args) => experiment_config(
            ExperimentKind::Potential,
            &args.common,
            Some(&args.fit),
            args.r_max,
        ),
        Command::Vegas(args) => {
            experiment_config(ExperimentKind::Vegas, &args.common, Some(&args.fit), 3)
        }
    };

    println!("Post-processing: {}", config.kind.display_name());
    let run = pipeline::run_experiment(&config)?;

    print!(
        "{}",
        crate::report::format_settings_found(&run.settings, &run.specs)
    );
    eprint!("{}", crate::report::format_settings_warnings(&run.settings));

    print!(
        "{}",
        crate::report::format_data_table(&run.columns, &run.series, run.extra.as_deref())
    );

    if let Some(fit) = &run.fit {
        print!("{}", crate::report::format_fit_summary(fit));
    }
    if let Some(warning) = &run.fit_warning {
        eprintln!("warning: {warning}");
    }

    if let (Some(path), Some(fit)) = (&config.export_fit, &run.fit) {
        crate::io::export::write_fit_json(path, config.kind, fit)?;
        println!("Wrote fit report to {}", path.display());
    }

    println!("Wrote plot to {}", run.plot_path.display());
    Ok(())
}

fn experiment_config(
    kind: ExperimentKind,
    common: &CommonArgs,
    fit: Option<&FitArgs>,
    r_max: usize,
) -> ExperimentConfig {
    ExperimentConfig {
        kind,
        settings_path: common.settings.clone(),
        data_path: common.data.clone(),
        plot_path: common.out.clone(),
        r_max,
        curve_samples: fit.map_or(500, |f| f.curve_samples),
        allow_fit_failure: fit.is_some_and(|f| f.allow_fit_failure),
        fit_max_iters: fit.and_then(|f| f.max_iters),
        export_fit: fit.and_then(|f| f.export_fit.clone()),
    }
}
