//! GitHub hub using octocrab

use std::sync::RwLock;

use async_trait::async_trait;
use gitmirror_core::config::GitHubConfig;
use gitmirror_core::{Hub, RepoDescriptor};
use octocrab::Octocrab;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Default GitHub domain
pub const GITHUB_DOMAIN: &str = "github.com";

#[derive(Debug, Clone, Default)]
struct Identity {
    account: String,
    token: String,
}

/// GitHub implementation of [`Hub`]
///
/// Authenticates with HTTP basic auth (account + personal access token) and
/// falls back to anonymous access when either is missing. A fresh API client
/// is built per call so identity changes take effect immediately.
pub struct GitHubHub {
    domain: String,
    api_url: Option<String>,
    strict_existence_check: bool,
    identity: RwLock<Identity>,
}

impl GitHubHub {
    /// Create a hub for github.com
    pub fn new(account: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            domain: GITHUB_DOMAIN.to_string(),
            api_url: None,
            strict_existence_check: false,
            identity: RwLock::new(Identity {
                account: account.into().trim().to_string(),
                token: token.into().trim().to_string(),
            }),
        }
    }

    /// Create a hub from configuration and optional credentials
    pub fn from_config(
        config: &GitHubConfig,
        account: Option<String>,
        token: Option<String>,
    ) -> Self {
        let mut hub = Self::new(account.unwrap_or_default(), token.unwrap_or_default())
            .with_domain(&config.domain)
            .with_strict_existence_check(config.strict_existence_check);
        hub.api_url = config.api_url.clone();
        hub
    }

    /// Serve a different domain (GitHub Enterprise)
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Talk to a different API base URL (GitHub Enterprise)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Only treat "Not Found" as absent in [`Hub::repository_exists`]
    pub fn with_strict_existence_check(mut self, strict: bool) -> Self {
        self.strict_existence_check = strict;
        self
    }

    /// Account API calls are made as
    pub fn account(&self) -> String {
        self.identity().account
    }

    fn identity(&self) -> Identity {
        self.identity
            .read()
            .map(|identity| identity.clone())
            .unwrap_or_default()
    }

    fn update_identity(&self, update: impl FnOnce(&mut Identity)) {
        match self.identity.write() {
            Ok(mut identity) => update(&mut *identity),
            Err(e) => warn!(error = %e, "GitHub identity lock poisoned"),
        }
    }

    /// Build an API client for the current identity
    fn client(&self) -> Result<Octocrab> {
        let identity = self.identity();
        let mut builder = Octocrab::builder();

        // https://github.com/settings/tokens
        if !identity.account.is_empty() && !identity.token.is_empty() {
            builder = builder.basic_auth(identity.account, identity.token);
        }

        if let Some(ref api_url) = self.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .map_err(|e| Error::Other(format!("Invalid GitHub API URL {}: {}", api_url, e)))?;
        }

        builder
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))
    }

    async fn exists(&self, repo: &RepoDescriptor) -> Result<bool> {
        let lookup = self
            .client()?
            .repos(repo.owner(), repo.name())
            .get()
            .await;

        match lookup {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) if self.strict_existence_check => Err(Error::Api(e)),
            Err(e) => {
                warn!(
                    repo = %repo.full_name(),
                    error = %e,
                    "Repository lookup failed, treating as absent"
                );
                Ok(false)
            }
        }
    }

    async fn create(&self, repo: &RepoDescriptor) -> Result<()> {
        let account = self.account();
        let route = create_route(&account, repo.owner());
        let body = CreateRepositoryRequest::from_descriptor(repo);

        debug!(%route, repo = %repo.full_name(), "Creating repository");
        let _: serde_json::Value = self.client()?.post(&route, Some(&body)).await?;

        info!(repo = %repo.full_name(), "Created GitHub repository");
        Ok(())
    }

    async fn fork(
        &self,
        source: &RepoDescriptor,
        destination: Option<&RepoDescriptor>,
    ) -> Result<()> {
        let account = self.account();
        let route = format!("/repos/{}/{}/forks", source.owner(), source.name());
        let body = ForkRequest::new(&account, destination);

        debug!(%route, organization = ?body.organization, name = ?body.name, "Forking repository");
        let _: serde_json::Value = self.client()?.post(&route, Some(&body)).await?;

        info!(source = %source.full_name(), "Fork requested");
        Ok(())
    }

    async fn delete(&self, repo: &RepoDescriptor) -> Result<()> {
        self.client()?
            .repos(repo.owner(), repo.name())
            .delete()
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    Error::RepoNotFound(repo.full_name())
                } else {
                    Error::Api(e)
                }
            })?;

        info!(repo = %repo.full_name(), "Deleted GitHub repository");
        Ok(())
    }
}

impl std::fmt::Debug for GitHubHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubHub")
            .field("domain", &self.domain)
            .field("api_url", &self.api_url)
            .field("account", &self.account())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Hub for GitHubHub {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn set_account(&self, account: &str) {
        self.update_identity(|identity| identity.account = account.trim().to_string());
    }

    fn set_password(&self, password: &str) {
        self.update_identity(|identity| identity.token = password.trim().to_string());
    }

    async fn repository_exists(&self, repo: &RepoDescriptor) -> gitmirror_core::Result<bool> {
        Ok(self.exists(repo).await?)
    }

    async fn repository_create(&self, repo: &RepoDescriptor) -> gitmirror_core::Result<()> {
        Ok(self.create(repo).await?)
    }

    async fn repository_fork(
        &self,
        source: &RepoDescriptor,
        destination: Option<&RepoDescriptor>,
    ) -> gitmirror_core::Result<()> {
        Ok(self.fork(source, destination).await?)
    }

    async fn repository_delete(&self, repo: &RepoDescriptor) -> gitmirror_core::Result<()> {
        Ok(self.delete(repo).await?)
    }
}

fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.message.contains("Not Found"))
}

/// Personal namespace when the owner is empty or the authenticated account
fn create_route(account: &str, owner: &str) -> String {
    if owner.is_empty() || owner.eq_ignore_ascii_case(account) {
        "/user/repos".to_string()
    } else {
        format!("/orgs/{}/repos", owner)
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
struct CreateRepositoryRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    homepage: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
}

impl<'a> CreateRepositoryRequest<'a> {
    fn from_descriptor(repo: &'a RepoDescriptor) -> Self {
        Self {
            name: repo.name(),
            description: non_empty(repo.description.as_ref()),
            homepage: non_empty(repo.homepage.as_ref()),
            visibility: repo.visibility.map(|v| v.as_str()),
            private: repo
                .visibility
                .map(|v| v != gitmirror_core::Visibility::Public),
        }
    }
}

#[derive(Debug, Serialize)]
struct ForkRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> ForkRequest<'a> {
    /// Forking "into" the authenticated account is expressed by omitting the organization
    fn new(account: &str, destination: Option<&'a RepoDescriptor>) -> Self {
        let Some(destination) = destination else {
            return Self {
                organization: None,
                name: None,
            };
        };

        let owner = destination.owner();
        let organization = if owner.is_empty() || owner.eq_ignore_ascii_case(account) {
            None
        } else {
            Some(owner)
        };

        Self {
            organization,
            name: Some(destination.name()).filter(|n| !n.is_empty()),
        }
    }
}
