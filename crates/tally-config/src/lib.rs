//! Tally Configuration System
//!
//! Provides configuration management for the tally test runner:
//! - Project configuration (tally.toml)
//! - Global user configuration (~/.tally/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.tally/config.toml)
//! 2. Project config (./tally.toml, searched upwards)
//! 3. Environment variables (TALLY_*)
//! 4. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use tally_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("tests live in {}", config.test_dir().display());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default directory searched when no paths are given
pub const DEFAULT_TEST_DIR: &str = "test";

/// Default file-name suffix identifying test files inside directories
pub const DEFAULT_TEST_SUFFIX: &str = "_test.tl";

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "tally.toml";

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{OutputConfig, ProjectConfig, RunnerConfig};
