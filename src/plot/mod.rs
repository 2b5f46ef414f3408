//! PNG plot rendering (plotters bitmap backend).

pub mod png;

pub use png::*;
