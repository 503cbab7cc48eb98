//! Runtime configuration: service location, transport timeout, log file.
//!
//! Values come from the environment (a `.env` file is loaded first), and CLI
//! flags override them.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const ENV_API_URL: &str = "HMEQ_API_URL";
const ENV_TIMEOUT_SECS: &str = "HMEQ_TIMEOUT_SECS";
const ENV_LOG_FILE: &str = "HMEQ_LOG_FILE";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Transport timeout per request. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Where the TUI writes log records (stderr is unusable while it runs).
    pub log_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: None,
            log_file: None,
        }
    }
}

/// CLI-provided values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ServiceConfig {
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    pub fn resolve(
        overrides: &ConfigOverrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let raw_url = overrides
            .api_url
            .clone()
            .or_else(|| lookup(ENV_API_URL))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = normalize_base_url(&raw_url)?;

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => Some(secs),
            None => match lookup(ENV_TIMEOUT_SECS) {
                Some(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<u64>().map_err(|e| {
                    AppError::usage(format!("Invalid {ENV_TIMEOUT_SECS} '{raw}': {e}"))
                })?),
                _ => None,
            },
        };
        let timeout = timeout_secs.filter(|&s| s > 0).map(Duration::from_secs);

        let log_file = lookup(ENV_LOG_FILE)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            base_url,
            timeout,
            log_file,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AppError::usage(format!(
            "Service URL must start with http:// or https:// (got: '{raw}')."
        )));
    }
    Ok(trimmed.to_string())
}
