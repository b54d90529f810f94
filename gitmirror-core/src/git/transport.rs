//! Git transport backed by libgit2

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{CredentialType, FetchOptions, PushOptions, RemoteCallbacks, Repository};
use tracing::debug;

use crate::auth::{Credentials, SSH_KEY_USER};
use crate::{Error, Result};

/// Fetch ref-spec of a mirror clone: every ref maps onto itself
const MIRROR_FETCH_REFSPEC: &str = "+refs/*:refs/*";

const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Local git operations the mirror pipeline needs
pub trait GitTransport: Send + Sync {
    /// Clone every ref of `url` into a bare mirror at `path`
    fn mirror_clone(
        &self,
        url: &str,
        path: &Path,
        credentials: Option<&Credentials>,
    ) -> Result<()>;

    /// Open an existing local repository
    fn open(&self, path: &Path) -> Result<Box<dyn LocalRepository>>;
}

/// Remote operations on an opened local repository
pub trait LocalRepository: Send {
    /// Register `name` pointing at `url` with mirror semantics
    fn add_mirror_remote(&self, name: &str, url: &str) -> Result<()>;

    /// Push `refspecs` to the named remote
    ///
    /// With `force` set every ref-spec is sent as a non-fast-forward update.
    fn push(
        &self,
        remote: &str,
        refspecs: &[&str],
        force: bool,
        credentials: Option<&Credentials>,
    ) -> Result<()>;
}

/// [`GitTransport`] implemented with `git2`
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Transport;

impl Git2Transport {
    /// Create a new transport
    pub fn new() -> Self {
        Self
    }
}

/// Fail early when the remote asks for a credential type we cannot answer
fn check_accepted(
    credentials: &Credentials,
    url: &str,
    allowed: CredentialType,
) -> std::result::Result<(), git2::Error> {
    if allowed.contains(credentials.credential_type()) {
        return Ok(());
    }
    Err(git2::Error::from_str(&format!(
        "{} credentials not accepted by {} (remote allows {:?})",
        credentials.kind(),
        url,
        allowed
    )))
}

fn remote_callbacks(credentials: Option<&Credentials>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    if let Some(credentials) = credentials {
        let mut attempts = 0;
        callbacks.credentials(move |url, username_from_url, allowed| {
            // libgit2 keeps asking as long as the server rejects us
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str(
                    "authentication failed: credentials rejected",
                ));
            }
            if allowed.contains(CredentialType::USERNAME) {
                return git2::Cred::username(username_from_url.unwrap_or(SSH_KEY_USER));
            }
            check_accepted(credentials, url, allowed)?;
            credentials.to_git2(username_from_url)
        });
    }
    callbacks
}

impl GitTransport for Git2Transport {
    fn mirror_clone(
        &self,
        url: &str,
        path: &Path,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        debug!(url, path = %path.display(), "Mirror-cloning repository");

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(credentials));

        let repo = RepoBuilder::new()
            .bare(true)
            .fetch_options(fetch_options)
            .remote_create(|repo, name, url| {
                repo.remote_with_fetch(name, url, MIRROR_FETCH_REFSPEC)
            })
            .clone(url, path)?;

        repo.config()?.set_bool("remote.origin.mirror", true)?;
        Ok(())
    }

    fn open(&self, path: &Path) -> Result<Box<dyn LocalRepository>> {
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::Config(format!("Not a git repository: {}", path.display()))
            } else {
                Error::Git(e)
            }
        })?;

        Ok(Box::new(Git2Repository {
            repo,
            root: path.to_path_buf(),
        }))
    }
}

/// An opened `git2` repository
pub struct Git2Repository {
    repo: Repository,
    root: PathBuf,
}

impl std::fmt::Debug for Git2Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git2Repository")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Git2Repository {
    /// Expand wildcard ref-specs against local references
    ///
    /// `refs/heads/*:refs/heads/*` becomes one concrete ref-spec per branch.
    fn expand_refspecs(&self, refspecs: &[&str], force: bool) -> Result<Vec<String>> {
        let mut expanded = Vec::new();

        for spec in refspecs {
            let spec = spec.trim_start_matches('+');
            let (src, dst) = spec.split_once(':').unwrap_or((spec, spec));
            let prefix = if force { "+" } else { "" };

            match (src.strip_suffix('*'), dst.strip_suffix('*')) {
                (Some(src_prefix), Some(dst_prefix)) => {
                    for reference in self.repo.references_glob(src)? {
                        let reference = reference?;
                        let Some(name) = reference.name() else {
                            continue;
                        };
                        let suffix = &name[src_prefix.len()..];
                        expanded.push(format!("{}{}:{}{}", prefix, name, dst_prefix, suffix));
                    }
                }
                _ => expanded.push(format!("{}{}:{}", prefix, src, dst)),
            }
        }

        Ok(expanded)
    }
}

impl LocalRepository for Git2Repository {
    fn add_mirror_remote(&self, name: &str, url: &str) -> Result<()> {
        self.repo.remote(name, url)?;
        self.repo
            .config()?
            .set_bool(&format!("remote.{}.mirror", name), true)?;
        Ok(())
    }

    fn push(
        &self,
        remote: &str,
        refspecs: &[&str],
        force: bool,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        let expanded = self.expand_refspecs(refspecs, force)?;
        if expanded.is_empty() {
            debug!(remote, "Nothing to push");
            return Ok(());
        }

        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());
        {
            let mut callbacks = remote_callbacks(credentials);
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejected.borrow_mut().push(format!("{}: {}", refname, message));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            let mut remote = self.repo.find_remote(remote)?;
            remote.push(&expanded, Some(&mut options))?;
        }

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(Error::Other(format!(
                "Remote rejected {} reference(s): {}",
                rejected.len(),
                rejected.join(", ")
            )));
        }

        debug!(remote, refs = expanded.len(), "Push complete");
        Ok(())
    }
}
