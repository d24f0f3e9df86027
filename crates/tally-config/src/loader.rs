//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{OutputConfig, ProjectConfig};
use crate::{ConfigResult, DEFAULT_TEST_DIR, DEFAULT_TEST_SUFFIX, PROJECT_CONFIG_FILE};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.tally/config.toml) - lowest priority
/// 2. Project config (./tally.toml) - overrides global
/// 3. Environment variables (TALLY_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration (with environment overrides applied)
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where tally.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.tally/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find tally.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        // Global config is optional; an unreadable one must not block a test run
        let global_config = self.load_global_config().unwrap_or_default();

        let project_config = self.apply_env_overrides(project_config);

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); a missing tally.toml yields defaults
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.tally/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognized: TALLY_TEST_DIR, TALLY_FAIL_FAST, TALLY_DEFER_OUTPUT, TALLY_VERBOSE
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ProjectConfig {
        if let Ok(dir) = env::var("TALLY_TEST_DIR") {
            config.runner_mut().test_dir = Some(PathBuf::from(dir));
        }

        if let Some(fail_fast) = env_flag("TALLY_FAIL_FAST") {
            config.runner_mut().fail_fast = Some(fail_fast);
        }

        if let Some(defer) = env_flag("TALLY_DEFER_OUTPUT") {
            config.runner_mut().defer_output = Some(defer);
        }

        if let Some(verbose) = env_flag("TALLY_VERBOSE") {
            config.output_mut().verbose = Some(verbose);
        }

        config
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a boolean environment variable ("1"/"true"/"yes" vs anything else)
fn env_flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

impl Config {
    /// Directory searched when no paths are given
    ///
    /// Relative to the project root when a tally.toml was found, otherwise to
    /// the working directory.
    pub fn test_dir(&self) -> PathBuf {
        let dir = self
            .project
            .runner
            .as_ref()
            .and_then(|r| r.test_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_DIR));

        match &self.project_root {
            Some(root) if dir.is_relative() => root.join(dir),
            _ => dir,
        }
    }

    /// File-name suffix identifying test files
    pub fn test_suffix(&self) -> &str {
        self.project
            .runner
            .as_ref()
            .and_then(|r| r.suffix.as_deref())
            .unwrap_or(DEFAULT_TEST_SUFFIX)
    }

    /// Whether fail-fast is enabled by configuration
    pub fn fail_fast(&self) -> bool {
        self.project
            .runner
            .as_ref()
            .and_then(|r| r.fail_fast)
            .unwrap_or(false)
    }

    /// Whether failure details are deferred to the end of the run
    pub fn defer_output(&self) -> bool {
        self.project
            .runner
            .as_ref()
            .and_then(|r| r.defer_output)
            .unwrap_or(false)
    }

    /// Effective output settings (project > global)
    pub fn output(&self) -> OutputConfig {
        let mut output = self.global.output.clone().unwrap_or_default();
        if let Some(project) = &self.project.output {
            output.merge(project);
        }
        output
    }

    /// Whether verbose output is enabled by configuration
    pub fn verbose(&self) -> bool {
        self.output().verbose.unwrap_or(false)
    }

    /// Whether colored output is enabled by configuration
    pub fn color(&self) -> bool {
        self.output().color.unwrap_or(true)
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }
}
