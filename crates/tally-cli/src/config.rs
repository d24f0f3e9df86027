//! CLI configuration via environment variables
//!
//! Settings that only make sense for the binary live here; everything that
//! can also be written in tally.toml is handled by `tally-config`.

use std::env;

/// Log filter used when `TALLY_LOG` is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Disable colored output (TALLY_NO_COLOR or NO_COLOR set to any non-empty value)
    pub no_color: bool,
    /// tracing filter directive (TALLY_LOG)
    pub log_filter: String,
}

impl CliConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            no_color: is_set("TALLY_NO_COLOR") || is_set("NO_COLOR"),
            log_filter: env::var("TALLY_LOG")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_set(name: &str) -> bool {
    env::var_os(name).is_some_and(|v| !v.is_empty())
}
