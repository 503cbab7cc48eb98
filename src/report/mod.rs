//! Reporting utilities: formatted text output for the CLI and TUI.

pub mod format;

pub use format::*;
