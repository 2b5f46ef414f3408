//! Fit-report JSON export.
//!
//! The fit JSON is the portable record of a run's estimate (string tension,
//! ground-state energy, ...): model kind, named parameters, and residual
//! diagnostics. It exists so downstream analysis does not have to re-parse
//! numbers off a plot.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ExperimentKind, FitReport};
use crate::error::PostError;

/// Schema of the exported fit JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub experiment: ExperimentKind,
    pub fit: FitReport,
    /// `name → value` in model parameter order, for human consumption.
    pub params: Vec<(String, f64)>,
}

/// Write a fit report as pretty-printed JSON.
pub fn write_fit_json(path: &Path, experiment: ExperimentKind, fit: &FitReport) -> Result<(), PostError> {
    let file = File::create(path).map_err(|e| PostError::FileWrite {
        path: path.to_path_buf(),
        message: format!("cannot create fit JSON: {e}"),
    })?;

    let out = FitFile {
        tool: "lpost".to_string(),
        experiment,
        fit: fit.clone(),
        params: fit
            .named_params()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    };

    serde_json::to_writer_pretty(file, &out).map_err(|e| PostError::FileWrite {
        path: path.to_path_buf(),
        message: format!("cannot serialize fit JSON: {e}"),
    })?;

    Ok(())
}

/// Read a previously exported fit JSON.
pub fn read_fit_json(path: &Path) -> Result<FitFile, PostError> {
    let file = File::open(path).map_err(|e| PostError::FileWrite {
        path: path.to_path_buf(),
        message: format!("cannot open fit JSON: {e}"),
    })?;
    serde_json::from_reader(file).map_err(|e| PostError::FileWrite {
        path: path.to_path_buf(),
        message: format!("invalid fit JSON: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;

    #[test]
    fn fit_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fit.json");

        let fit = FitReport {
            model: ModelKind::CornellPotential,
            params: vec![2.0, 1.5, 0.3],
            residual_norm: 1.2e-8,
            iterations: 17,
            n_points: 3,
        };
        write_fit_json(&path, ExperimentKind::Potential, &fit).unwrap();

        let loaded = read_fit_json(&path).unwrap();
        assert_eq!(loaded.tool, "lpost");
        assert_eq!(loaded.experiment, ExperimentKind::Potential);
        assert_eq!(loaded.params[0].0, "sigma");
        assert!((loaded.fit.params[1] - 1.5).abs() < 1e-12);
    }
}
