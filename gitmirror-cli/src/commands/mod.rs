//! CLI command implementations

pub mod auth;
pub mod fork;
pub mod migrate;

pub use fork::ForkArgs;
pub use migrate::MigrateArgs;

use std::sync::Arc;

use gitmirror_core::{Config, Hub, RepoDescriptor, Secrets};
use gitmirror_github::GitHubHub;

/// Parse `url` and attach a GitHub hub when it is hosted on the configured domain
pub fn endpoint(
    url: &str,
    config: &Config,
    secrets: &Secrets,
) -> anyhow::Result<RepoDescriptor> {
    let repo = RepoDescriptor::parse(url)?;

    let on_github = repo
        .host()
        .is_some_and(|host| host.eq_ignore_ascii_case(&config.github.domain));

    if !on_github {
        tracing::debug!(url, "No hosting provider for endpoint");
        return Ok(repo);
    }

    let hub: Arc<dyn Hub> = Arc::new(GitHubHub::from_config(
        &config.github,
        secrets.github_account(),
        secrets.github_token(),
    ));
    Ok(repo.with_hub(hub))
}
