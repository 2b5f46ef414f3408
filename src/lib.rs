//! `lattice-post` library crate.
//!
//! The binary (`lpost`) is a thin wrapper around this library so that:
//!
//! - the full pipeline (settings → table → fit → plot) is testable without
//!   spawning processes
//! - modules are reusable (e.g., new experiments, batch drivers)
//! - code stays easy to navigate as more post-processing macros are ported

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
