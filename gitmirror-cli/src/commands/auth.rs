//! Transport credential flags

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use gitmirror_core::{Credentials, Secrets};

/// How clone and push authenticate
#[derive(Args, Debug, Default)]
pub struct AuthArgs {
    /// SSH private key for clone and push
    #[arg(long, conflicts_with_all = ["default_ssh_key", "basic"])]
    pub ssh_key: Option<PathBuf>,

    /// Passphrase for the SSH key
    #[arg(long, env = "GITMIRROR_SSH_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Use ~/.ssh/id_rsa when it exists
    #[arg(long, conflicts_with = "basic")]
    pub default_ssh_key: bool,

    /// Use the GitHub account and token over HTTPS
    #[arg(long)]
    pub basic: bool,
}

impl AuthArgs {
    /// Resolve the requested credentials
    ///
    /// Without flags, a key configured in the secrets file is used if present.
    pub fn credentials(&self, secrets: &Secrets) -> anyhow::Result<Option<Credentials>> {
        let passphrase = self
            .passphrase
            .as_deref()
            .or(secrets.ssh.passphrase.as_deref());

        if let Some(ref key) = self.ssh_key {
            return Ok(Some(Credentials::ssh_key_from_file(key, passphrase)?));
        }

        if self.default_ssh_key {
            return Ok(Credentials::default_ssh_key(passphrase));
        }

        if self.basic {
            let credentials = secrets.github_basic_credentials().context(
                "--basic needs a GitHub account and token (GITHUB_ACCOUNT/GITHUB_TOKEN or secrets file)",
            )?;
            return Ok(Some(credentials));
        }

        match secrets.ssh.key_path {
            Some(ref key) => Ok(Some(Credentials::ssh_key_from_file(key, passphrase)?)),
            None => Ok(None),
        }
    }
}
