//! Project Configuration (tally.toml)
//!
//! Handles project-level configuration stored in `tally.toml` at the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from tally.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Test selection and execution settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerConfig>,

    /// Console output settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Directory searched when no paths are given (default: "test")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_dir: Option<PathBuf>,

    /// File-name suffix of test files found in directories (default: "_test.tl")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    /// Stop after the first failure or error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,

    /// Print failure details after the run instead of inline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defer_output: Option<bool>,
}

/// Output configuration, shared by project and global config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Colorize output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,

    /// Print one line per test with timing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl OutputConfig {
    /// Merge another output config into this one, field by field
    pub fn merge(&mut self, other: &OutputConfig) {
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let Some(runner) = &self.runner else {
            return Ok(());
        };

        if let Some(suffix) = &runner.suffix {
            if suffix.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "runner.suffix".to_string(),
                    reason: "suffix cannot be empty".to_string(),
                });
            }
            if suffix.contains('/') || suffix.contains('\\') {
                return Err(ConfigError::InvalidValue {
                    field: "runner.suffix".to_string(),
                    reason: format!("suffix must be a file name ending, got '{}'", suffix),
                });
            }
        }

        if let Some(dir) = &runner.test_dir {
            if dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    field: "runner.test_dir".to_string(),
                    reason: format!(
                        "must be relative to the project root, got '{}'",
                        dir.display()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the runner section, creating it if absent
    pub fn runner_mut(&mut self) -> &mut RunnerConfig {
        self.runner.get_or_insert_with(RunnerConfig::default)
    }

    /// Get the output section, creating it if absent
    pub fn output_mut(&mut self) -> &mut OutputConfig {
        self.output.get_or_insert_with(OutputConfig::default)
    }
}
