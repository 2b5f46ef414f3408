//! Shared domain types.
//!
//! These types are intentionally kept lightweight and (where useful)
//! serializable so they can be:
//!
//! - passed between pipeline stages without back-references
//! - exported to JSON for downstream analysis
//! - constructed directly in tests

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::ModelKind;

/// Which reference post-processing macro a run reproduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentKind {
    /// 1D path-integral energy estimators (`ΔE(t)` vs `t`, exact overlay).
    Propagator,
    /// Quark potential from R×T Wilson loops (Cornell fit).
    Potential,
    /// Harmonic-oscillator propagator from Vegas integration (Gaussian fit).
    Vegas,
}

impl ExperimentKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ExperimentKind::Propagator => "1D path integral propagator",
            ExperimentKind::Potential => "quark potential",
            ExperimentKind::Vegas => "Vegas propagator",
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults). The reference scripts
/// hardcode every path; here they are explicit inputs.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub kind: ExperimentKind,
    /// Path to the C++-style settings header (e.g. `SETTINGS.h`).
    pub settings_path: PathBuf,
    /// Data table path. `None` means "use the experiment's default"
    /// (for the propagator that default comes out of the settings file).
    pub data_path: Option<PathBuf>,
    /// Output PNG path. `None` means the experiment's default name.
    pub plot_path: Option<PathBuf>,
    /// Maximum `r/a` row count for the potential fit.
    pub r_max: usize,
    /// Number of samples used to draw a fitted overlay curve.
    pub curve_samples: usize,
    /// On fit failure, warn and plot raw data instead of aborting.
    pub allow_fit_failure: bool,
    /// Override of the optimizer's iteration budget.
    pub fit_max_iters: Option<usize>,
    /// Optional JSON export of the fit report.
    pub export_fit: Option<PathBuf>,
}

/// How many leading rows of a loaded table to keep.
///
/// Truncation is a per-experiment policy, not a loader default: the
/// propagator macro keeps a fixed fraction of the estimator rows (the tail
/// is noise-dominated), the potential macro keeps a fixed `r/a` prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowLimit {
    All,
    /// Keep the first `n` rows (capped at the table length).
    Count(usize),
    /// Keep `round(f·n) + 1` rows (capped at the table length).
    Fraction(f64),
}

impl RowLimit {
    /// Resolve the limit against a concrete row count.
    pub fn resolve(self, n_rows: usize) -> usize {
        match self {
            RowLimit::All => n_rows,
            RowLimit::Count(n) => n.min(n_rows),
            RowLimit::Fraction(f) => {
                let kept = (f * n_rows as f64).round() as usize + 1;
                kept.min(n_rows)
            }
        }
    }
}

/// The data actually plotted: x, y, and optional per-point errors.
///
/// Columns are extracted positionally from the loaded table; by the time a
/// `Series` exists, truncation has already been applied.
#[derive(Debug, Clone, Default)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub err: Option<Vec<f64>>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }
}

/// An overlay curve: a fitted model or a theoretical reference line.
///
/// Plain `(x, y)` pairs; the renderer does not know (or care) where the
/// curve came from.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    /// RGB line color.
    pub color: (u8, u8, u8),
}

/// Legend placement, matching the positions used by the reference macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPos {
    UpperRight,
    UpperCenter,
    LowerCenter,
}

/// Display configuration for the plot renderer.
#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Fixed axis ranges; `None` means derive from the data with padding.
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub legend: LegendPos,
    /// Legend label for the error-bar data series.
    pub data_label: String,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

/// Fitted parameters plus diagnostics, produced once per run.
///
/// Plain data, independent of the plotting step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub model: ModelKind,
    pub params: Vec<f64>,
    /// Final robustified residual norm `sqrt(Σ z_i²)`.
    pub residual_norm: f64,
    pub iterations: usize,
    pub n_points: usize,
}

impl FitReport {
    /// `(name, value)` pairs in model parameter order.
    pub fn named_params(&self) -> Vec<(&'static str, f64)> {
        self.model
            .param_names()
            .iter()
            .copied()
            .zip(self.params.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_limit_matches_reference_rule() {
        // The propagator macro keeps round(0.34·n)+1 rows.
        assert_eq!(RowLimit::Fraction(0.34).resolve(100), 35);
        assert_eq!(RowLimit::Fraction(0.34).resolve(50), 18);
    }

    #[test]
    fn experiment_labels_are_distinct() {
        let names = [
            ExperimentKind::Propagator,
            ExperimentKind::Potential,
            ExperimentKind::Vegas,
        ]
        .map(ExperimentKind::display_name);
        assert!(names.iter().all(|n| !n.is_empty()));
        assert_ne!(names[0], names[1]);
        assert_ne!(names[1], names[2]);
        assert_ne!(names[0], names[2]);
    }

    #[test]
    fn limits_are_capped_at_table_length() {
        assert_eq!(RowLimit::Count(10).resolve(5), 5);
        assert_eq!(RowLimit::Fraction(1.0).resolve(5), 5);
        assert_eq!(RowLimit::All.resolve(7), 7);
    }
}
