//! Hosting provider abstraction
//!
//! A [`Hub`] is one hosting provider's API surface. The orchestrator and the
//! mirror pipeline only ever talk to this trait.

use async_trait::async_trait;

use crate::repository::RepoDescriptor;
use crate::{Error, Result};

/// Capabilities a hosting provider plugs in
#[async_trait]
pub trait Hub: Send + Sync {
    /// Stable identity of the provider (e.g. `github.com`)
    ///
    /// Used as the host when rendering URLs and to decide whether two
    /// endpoints can be linked with a provider-side fork.
    fn domain(&self) -> &str;

    /// Replace the account used for subsequent API calls
    fn set_account(&self, account: &str);

    /// Replace the token or password used for subsequent API calls
    fn set_password(&self, password: &str);

    /// Check whether the repository exists
    ///
    /// "Not found" is `Ok(false)`, never an error. Implementations may fold
    /// other failures into `Ok(false)` as well, so callers cannot tell an
    /// absent repository from a transient provider failure.
    async fn repository_exists(&self, repo: &RepoDescriptor) -> Result<bool>;

    /// Create the repository under its owner
    ///
    /// Description, homepage and visibility are sent when set.
    async fn repository_create(&self, repo: &RepoDescriptor) -> Result<()>;

    /// Fork `source` on the provider
    ///
    /// With no destination the fork lands in the authenticated account under
    /// the source's name.
    async fn repository_fork(
        &self,
        source: &RepoDescriptor,
        destination: Option<&RepoDescriptor>,
    ) -> Result<()>;

    /// Delete the repository
    ///
    /// Optional: providers without a delete call keep the default, which
    /// fails without touching the repository.
    async fn repository_delete(&self, repo: &RepoDescriptor) -> Result<()> {
        Err(Error::Other(format!(
            "repository deletion not supported by {} ({})",
            self.domain(),
            repo.full_name()
        )))
    }
}
