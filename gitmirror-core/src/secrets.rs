//! Secrets management for gitmirror
//!
//! Credentials live apart from configuration in
//! `~/.config/gitmirror/secrets.toml`, which must be mode 0600 on Unix.
//!
//! Loading priority:
//! 1. Environment variables (GITHUB_ACCOUNT, GITHUB_TOKEN)
//! 2. Secrets file (~/.config/gitmirror/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub account and token
    pub github: GitHubSecrets,

    /// SSH key used by the git transport
    pub ssh: SshSecrets,
}

/// GitHub-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// Account name used for basic authentication
    pub account: Option<String>,

    /// GitHub Personal Access Token
    pub token: Option<String>,
}

/// SSH key secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SshSecrets {
    /// Private key path
    pub key_path: Option<PathBuf>,

    /// Passphrase protecting the key
    pub passphrase: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        for value in [&mut secrets.github.account, &mut secrets.github.token]
            .into_iter()
            .flatten()
        {
            *value = value.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/gitmirror/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitmirror").join("secrets.toml"))
    }

    /// GitHub account, GITHUB_ACCOUNT overriding the file
    pub fn github_account(&self) -> Option<String> {
        env_or("GITHUB_ACCOUNT", self.github.account.as_deref())
    }

    /// GitHub token, GITHUB_TOKEN overriding the file
    pub fn github_token(&self) -> Option<String> {
        env_or("GITHUB_TOKEN", self.github.token.as_deref())
    }

    /// Basic credentials for HTTPS transport, when both halves are known
    pub fn github_basic_credentials(&self) -> Option<Credentials> {
        Some(Credentials::basic(self.github_account()?, self.github_token()?))
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# gitmirror secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[github]
# Account the token belongs to
account = ""
# GitHub Personal Access Token
# Create at: https://github.com/settings/tokens
# Required permissions: repo (create, fork, delete_repo for compensating deletes)
token = ""

[ssh]
# key_path = "/home/you/.ssh/id_ed25519"
# passphrase = ""
"#;

        std::fs::write(&path, template).map_err(Error::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your tokens");

        Ok(path)
    }
}

fn env_or(var: &str, fallback: Option<&str>) -> Option<String> {
    if let Ok(value) = std::env::var(var) {
        let value = value.trim().to_string();
        if !value.is_empty() {
            debug!(var, "Using value from environment");
            return Some(value);
        }
    }

    fallback
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
