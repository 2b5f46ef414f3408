//! Terminal reporting: data tables, fit summaries, settings diagnostics.

pub mod format;

pub use format::*;
