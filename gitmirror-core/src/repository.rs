//! Repository descriptor
//!
//! One side (source or destination) of a migration: where the repository
//! lives, who owns it, how to reach it and, optionally, which hosting
//! provider manages it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::git::url::{render_url, ParsedUrl};
use crate::hub::Hub;
use crate::{Error, Result};

/// Visibility requested when creating a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone
    Public,
    /// Visible to collaborators only
    Private,
    /// Visible to members of the enterprise
    Internal,
}

impl Visibility {
    /// Provider wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            "internal" => Ok(Visibility::Internal),
            other => Err(Error::Config(format!(
                "Unknown visibility '{}'. Expected public, private or internal",
                other
            ))),
        }
    }
}

/// A parsed, addressable git repository
///
/// Owner, name and URL form are private so the remembered raw URL can never
/// disagree with them: every setter that changes identity forgets it, and
/// [`RepoDescriptor::url`] falls back to rendering from the hub's domain.
#[derive(Clone, Default)]
pub struct RepoDescriptor {
    raw_url: Option<String>,
    host: Option<String>,
    owner: String,
    name: String,
    ssh: bool,

    /// Working clone location; defaults to the repository name
    pub local_path: Option<PathBuf>,
    /// Used only when creating the repository
    pub description: Option<String>,
    /// Used only when creating the repository
    pub homepage: Option<String>,
    /// Used only when creating the repository
    pub visibility: Option<Visibility>,

    hub: Option<Arc<dyn Hub>>,
    credentials: Option<Credentials>,
}

impl RepoDescriptor {
    /// Create an empty descriptor
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a descriptor by parsing a raw URL
    pub fn parse(url: &str) -> Result<Self> {
        let mut repo = Self::new();
        repo.set_url(url)?;
        Ok(repo)
    }

    /// Create a descriptor from owner and name, rendered through its hub
    pub fn from_parts(owner: impl Into<String>, name: impl Into<String>, ssh: bool) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ssh,
            ..Self::default()
        }
    }

    /// Parse `url` and adopt its owner, name and form
    ///
    /// On failure the descriptor is left untouched.
    pub fn set_url(&mut self, url: &str) -> Result<()> {
        let parsed = ParsedUrl::parse(url)?;
        self.owner = parsed.owner;
        self.name = parsed.name;
        self.ssh = parsed.ssh;
        self.host = parsed.host;
        self.raw_url = Some(url.trim().to_string());
        Ok(())
    }

    /// Attach a hosting provider
    pub fn with_hub(mut self, hub: Arc<dyn Hub>) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Attach transport credentials
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the working clone location
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Replace the hosting provider
    pub fn set_hub(&mut self, hub: Option<Arc<dyn Hub>>) {
        self.hub = hub;
    }

    /// Replace the transport credentials
    pub fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    /// Change the owner; forgets the parsed raw URL
    pub fn set_owner(&mut self, owner: impl Into<String>) {
        self.owner = owner.into();
        self.raw_url = None;
    }

    /// Change the name; forgets the parsed raw URL
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.raw_url = None;
    }

    /// Switch between the SSH shorthand and the HTTPS form; forgets the parsed raw URL
    pub fn set_ssh_form(&mut self, ssh: bool) {
        self.ssh = ssh;
        self.raw_url = None;
    }

    /// Organization or user segment
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name without `.git`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the URL uses the `user@host:owner/name` form
    pub fn is_ssh_form(&self) -> bool {
        self.ssh
    }

    /// Host parsed from the URL, if any
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Hosting provider, if any
    pub fn hub(&self) -> Option<&Arc<dyn Hub>> {
        self.hub.as_ref()
    }

    /// Transport credentials, if any
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Clone URL of this repository
    ///
    /// Returns the parsed URL when identity has not changed since parsing,
    /// otherwise renders one from the hub's domain. Rendering without a hub is
    /// a configuration error.
    pub fn url(&self) -> Result<String> {
        if let Some(ref raw) = self.raw_url {
            return Ok(raw.clone());
        }

        let hub = self.hub.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "Cannot render URL for {}/{}: no hosting provider attached",
                self.owner, self.name
            ))
        })?;

        Ok(render_url(hub.domain(), &self.owner, &self.name, self.ssh))
    }

    /// Working clone location, defaulting to the repository name
    pub fn local_path(&self) -> PathBuf {
        self.local_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name))
    }

    /// Human-readable `owner/name` label
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Debug for RepoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoDescriptor")
            .field("raw_url", &self.raw_url)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("ssh", &self.ssh)
            .field("local_path", &self.local_path)
            .field("hub", &self.hub.as_ref().map(|h| h.domain().to_string()))
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
