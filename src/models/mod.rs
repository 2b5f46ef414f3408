//! Closed-form fit models.

pub mod model;

pub use model::*;
