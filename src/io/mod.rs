//! Input/output helpers.
//!
//! - settings-header parsing + validation (`settings`)
//! - delimited numeric table loading (`table`)
//! - fit-report JSON export (`export`)

pub mod export;
pub mod settings;
pub mod table;

pub use export::*;
pub use settings::*;
pub use table::*;
