//! Fork command

use clap::Args;
use gitmirror_core::{Config, Migrator, Secrets};

use super::endpoint;

/// Arguments for the fork command
#[derive(Args, Debug)]
pub struct ForkArgs {
    /// Repository to fork
    #[arg(required = true)]
    pub url: String,

    /// Fork target (defaults to the authenticated account, same name)
    #[arg(long)]
    pub to: Option<String>,
}

impl ForkArgs {
    /// Execute the fork command
    pub async fn execute(&self, config: &Config, secrets: &Secrets) -> anyhow::Result<()> {
        let source = endpoint(&self.url, config, secrets)?;
        if source.hub().is_none() {
            anyhow::bail!(
                "{} is not hosted on {}; only GitHub repositories can be forked",
                self.url,
                config.github.domain
            );
        }

        let destination = match self.to {
            Some(ref to) => Some(endpoint(to, config, secrets)?),
            None => None,
        };

        println!("Forking {}", source.full_name());
        Migrator::new().fork(&source, destination.as_ref()).await?;
        println!("Fork requested");

        Ok(())
    }
}
