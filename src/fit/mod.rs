//! Robust nonlinear least-squares fitting.
//!
//! Responsibilities:
//!
//! - robustify residuals (soft-L1 loss)
//! - minimize over the parameter vector (Levenberg–Marquardt)
//! - enforce optional per-parameter box bounds

pub mod least_squares;

pub use least_squares::*;
