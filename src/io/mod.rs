//! Input/output helpers.
//!
//! - application JSON ingest (`application`)
//! - session report exports (JSON/Markdown) (`export`)

pub mod application;
pub mod export;

pub use application::*;
pub use export::*;
