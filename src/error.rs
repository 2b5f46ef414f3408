//! Crate-wide error type.
//!
//! Every failure an `lpost` run can hit maps to one variant with a stable
//! exit code, so batch drivers can distinguish "bad settings" from "bad
//! data" from "fit blew up" without parsing messages:
//!
//! - 2: settings file problems
//! - 3: data file problems
//! - 4: fit problems (infeasible bounds, non-convergence)
//! - 5: plot/export could not be written
//!
//! A missing settings *parameter* is deliberately not an error: the
//! reference headers are hand-edited and frequently omit values, so the
//! reader applies a typed default and records a warning instead
//! (see `io::settings::Settings::missing`).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    /// The settings header could not be opened.
    #[error("settings file '{path}' not found: {source}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data table is malformed (short row, non-numeric cell, missing
    /// file, out-of-range column). `line` is 1-based; 0 means the problem
    /// is not tied to a specific line.
    #[error("malformed data in '{path}' (line {line}): {message}")]
    DataFormat {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The requested parameter box is infeasible (a lower bound above its
    /// upper bound), typically because a settings parameter the bounds are
    /// built from was missing and defaulted.
    #[error("infeasible fit bounds: {message}")]
    InfeasibleBounds { message: String },

    /// The optimizer exhausted its iteration budget without meeting the
    /// convergence tolerances.
    #[error("fit did not converge after {iterations} iterations (residual norm {residual_norm:.6e})")]
    FitDidNotConverge {
        iterations: usize,
        residual_norm: f64,
    },

    /// The plot (or fit export) could not be written.
    #[error("failed to write '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },
}

impl PostError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PostError::ConfigNotFound { .. } => 2,
            PostError::DataFormat { .. } => 3,
            PostError::InfeasibleBounds { .. } => 4,
            PostError::FitDidNotConverge { .. } => 4,
            PostError::FileWrite { .. } => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        let err = PostError::FitDidNotConverge {
            iterations: 100,
            residual_norm: 1.0,
        };
        assert_eq!(err.exit_code(), 4);

        let err = PostError::FileWrite {
            path: PathBuf::from("plot.png"),
            message: "disk full".to_string(),
        };
        assert_eq!(err.exit_code(), 5);
    }
}
