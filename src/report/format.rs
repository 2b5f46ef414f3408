//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future golden tests)
//!
//! All helpers return `String`s; the `app` layer decides where they go
//! (stdout for diagnostics, stderr for warnings).

use crate::domain::{FitReport, Series};
use crate::io::settings::{ParamSpec, Settings};

/// The "Generating plot with following data" table the reference macros
/// print before saving: one row per plotted sample.
///
/// `extra` is an optional fourth column (the Vegas macro echoes the
/// asymptotic column alongside x/value/error).
pub fn format_data_table(
    columns: &[&str],
    series: &Series,
    extra: Option<&[f64]>,
) -> String {
    let mut out = String::new();
    out.push_str("Generating plot with following data\n");
    out.push_str(&columns.join("     "));
    out.push('\n');

    let zero = vec![0.0; series.len()];
    let err = series.err.as_deref().unwrap_or(&zero);
    for i in 0..series.len() {
        out.push_str(&format!("{} {} {}", series.x[i], series.y[i], err[i]));
        if let Some(extra) = extra {
            out.push_str(&format!(" {}", extra[i]));
        }
        out.push('\n');
    }
    out
}

/// Fit diagnostics: named parameters, residual norm, iteration count.
pub fn format_fit_summary(fit: &FitReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Fit: {}\n", fit.model.display_name()));
    for (name, value) in fit.named_params() {
        out.push_str(&format!("  {name} = {value:.6}\n"));
    }
    out.push_str(&format!(
        "  residual norm = {:.6e} ({} points, {} iterations)\n",
        fit.residual_norm, fit.n_points, fit.iterations
    ));
    out
}

/// "Found in header file ..." lines for every extracted parameter, matching
/// the reference scripts.
pub fn format_settings_found(settings: &Settings, specs: &[ParamSpec]) -> String {
    let mut out = String::new();
    for (name, value) in settings.found(specs) {
        out.push_str(&format!("Found in header file {name} = {value}\n"));
    }
    out
}

/// One warning line per parameter that fell back to its default.
pub fn format_settings_warnings(settings: &Settings) -> String {
    let mut out = String::new();
    for name in &settings.missing {
        out.push_str(&format!(
            "warning: parameter `{name}` not found in settings; using default\n"
        ));
    }
    out
}
