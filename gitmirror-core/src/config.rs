//! Configuration management for gitmirror
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITMIRROR_*)
//! 3. Config file (~/.config/gitmirror/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pipeline::{PipelineOptions, MIRROR_REMOTE_NAME};
use crate::{Error, Result};

/// Mirror pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Base directory for working clones (current directory when unset)
    pub work_dir: Option<PathBuf>,

    /// Remote name used for the destination
    pub remote_name: String,

    /// Delete a repository created by a run whose push failed
    pub delete_created_on_push_failure: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            remote_name: MIRROR_REMOTE_NAME.to_string(),
            delete_created_on_push_failure: false,
        }
    }
}

/// GitHub provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Domain repositories are hosted on
    pub domain: String,

    /// API base URL, for GitHub Enterprise
    pub api_url: Option<String>,

    /// Only treat "Not Found" as absent; surface other lookup failures
    pub strict_existence_check: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            domain: "github.com".to_string(),
            api_url: None,
            strict_existence_check: false,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Mirror pipeline configuration
    pub mirror: MirrorConfig,

    /// GitHub configuration
    pub github: GitHubConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gitmirror/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitmirror").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITMIRROR_WORK_DIR: Base directory for working clones
    /// - GITMIRROR_GITHUB_DOMAIN: GitHub domain
    /// - GITMIRROR_GITHUB_API_URL: GitHub API base URL
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(work_dir) = std::env::var("GITMIRROR_WORK_DIR") {
            self.mirror.work_dir = Some(PathBuf::from(work_dir));
        }

        if let Ok(domain) = std::env::var("GITMIRROR_GITHUB_DOMAIN") {
            self.github.domain = domain;
        }

        if let Ok(api_url) = std::env::var("GITMIRROR_GITHUB_API_URL") {
            self.github.api_url = Some(api_url);
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, work_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = work_dir {
            self.mirror.work_dir = Some(dir);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(work_dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(work_dir))
    }

    /// Pipeline options described by this configuration
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            work_dir: self.mirror.work_dir.clone(),
            remote_name: self.mirror.remote_name.clone(),
            delete_created_on_push_failure: self.mirror.delete_created_on_push_failure,
        }
    }
}
