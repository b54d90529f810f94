//! Migrate and mirror commands

use std::path::PathBuf;

use clap::Args;
use gitmirror_core::{choose_strategy, Config, Migrator, Secrets, Strategy, Visibility};

use super::auth::AuthArgs;
use super::endpoint;

/// Arguments for the migrate and mirror commands
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Source repository URL
    #[arg(required = true)]
    pub from: String,

    /// Destination repository URL
    #[arg(required = true)]
    pub to: String,

    /// Description for a newly created destination
    #[arg(long)]
    pub description: Option<String>,

    /// Homepage for a newly created destination
    #[arg(long)]
    pub homepage: Option<String>,

    /// Visibility for a newly created destination (public, private, internal)
    #[arg(long)]
    pub visibility: Option<Visibility>,

    /// Working clone directory, relative to the work dir (defaults to the repository name)
    #[arg(long)]
    pub local_path: Option<PathBuf>,

    /// Show what would happen without touching anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub auth: AuthArgs,
}

impl MigrateArgs {
    /// Execute the command; `force_mirror` skips the fork decision
    pub async fn execute(
        &self,
        config: &Config,
        secrets: &Secrets,
        force_mirror: bool,
    ) -> anyhow::Result<()> {
        let credentials = self.auth.credentials(secrets)?;

        let mut source =
            endpoint(&self.from, config, secrets)?.with_credentials(credentials.clone());
        if let Some(ref path) = self.local_path {
            source.local_path = Some(path.clone());
        }

        let mut destination =
            endpoint(&self.to, config, secrets)?.with_credentials(credentials);
        destination.description = self.description.clone();
        destination.homepage = self.homepage.clone();
        destination.visibility = self.visibility;

        let strategy = if force_mirror {
            Strategy::MirrorPush
        } else {
            choose_strategy(&source, &destination)
        };

        println!("gitmirror {}", strategy);
        println!("  from: {}", source.url()?);
        println!("  to:   {}", destination.url()?);
        println!();

        if self.dry_run {
            println!(
                "[Dry run] Would {} {} to {}",
                strategy,
                source.full_name(),
                destination.full_name()
            );
            return Ok(());
        }

        let migrator = Migrator::new().with_options(config.pipeline_options());
        if force_mirror {
            migrator.mirror_push(&source, &mut destination).await?;
        } else {
            migrator.migrate(&source, &mut destination).await?;
        }

        println!("Done");
        Ok(())
    }
}
