//! Logger setup (`env_logger` behind the `log` facade).
//!
//! Filtering follows `RUST_LOG` and defaults to `warn`. The TUI owns the
//! terminal, so it either logs to a file or not at all.

use std::fs::OpenOptions;
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Disabled,
}

impl LogTarget {
    /// Target for the TUI: the configured file, otherwise nothing.
    pub fn for_tui(log_file: Option<PathBuf>) -> Self {
        match log_file {
            Some(path) => LogTarget::File(path),
            None => LogTarget::Disabled,
        }
    }
}

pub fn init(target: LogTarget) -> Result<(), AppError> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    match target {
        LogTarget::Disabled => return Ok(()),
        LogTarget::Stderr => {}
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| AppError::usage(format!("Failed to open log file '{}': {e}", path.display())))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }

    // A logger may already be installed (tests, embedding); keep it.
    let _ = builder.try_init();
    Ok(())
}
