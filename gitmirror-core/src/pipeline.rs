//! Mirror pipeline
//!
//! clone -> open -> add mirror remote -> ensure destination exists -> push,
//! followed by unconditional removal of the working directory.
//!
//! The pipeline is best effort, not transactional: a destination repository
//! created in this run survives a later push failure unless
//! [`PipelineOptions::delete_created_on_push_failure`] is set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::events::{EventSink, MigrationEvent};
use crate::git::GitTransport;
use crate::repository::RepoDescriptor;
use crate::{Error, Result};

/// Name of the remote the destination is registered under
pub const MIRROR_REMOTE_NAME: &str = "mirror";

/// Ref-specs pushed to the destination, always with force
pub const MIRROR_PUSH_REFSPECS: [&str; 2] =
    ["+refs/heads/*:refs/heads/*", "+refs/tags/*:refs/tags/*"];

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Base directory for working clones (current directory when unset)
    pub work_dir: Option<PathBuf>,
    /// Remote name used for the destination
    pub remote_name: String,
    /// Delete a repository created by this run when the push fails
    pub delete_created_on_push_failure: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            work_dir: None,
            remote_name: MIRROR_REMOTE_NAME.to_string(),
            delete_created_on_push_failure: false,
        }
    }
}

/// Moves every branch and tag from a source to a destination through one
/// local mirror clone
pub struct MirrorPipeline {
    transport: Arc<dyn GitTransport>,
    events: Arc<dyn EventSink>,
    options: PipelineOptions,
}

impl std::fmt::Debug for MirrorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorPipeline")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MirrorPipeline {
    /// Create a pipeline
    pub fn new(
        transport: Arc<dyn GitTransport>,
        events: Arc<dyn EventSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transport,
            events,
            options,
        }
    }

    /// Working directory a run for `source` would use
    pub fn working_dir(&self, source: &RepoDescriptor) -> Result<PathBuf> {
        let base = match self.options.work_dir {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(base.join(source.local_path()))
    }

    /// Run the pipeline
    ///
    /// `destination.local_path` is pointed at the shared working clone. The
    /// working directory is removed on every exit path once it exists.
    pub async fn run(
        &self,
        source: &RepoDescriptor,
        destination: &mut RepoDescriptor,
    ) -> Result<()> {
        let source_url = source.url()?;
        let destination_url = destination.url()?;
        let path = self.working_dir(source)?;

        if path.exists() {
            return Err(Error::Config(format!(
                "Working directory {} already exists. Remove it or choose another local path.",
                path.display()
            )));
        }

        let result = self
            .run_steps(&path, &source_url, &destination_url, source, destination)
            .await;

        self.cleanup(&path);
        result
    }

    async fn run_steps(
        &self,
        path: &Path,
        source_url: &str,
        destination_url: &str,
        source: &RepoDescriptor,
        destination: &mut RepoDescriptor,
    ) -> Result<()> {
        debug!(url = source_url, path = %path.display(), "git clone --mirror");
        self.transport
            .mirror_clone(source_url, path, source.credentials())?;
        self.events.emit(&MigrationEvent::CloneComplete {
            path: path.to_path_buf(),
        });

        destination.local_path = Some(path.to_path_buf());
        let local = self.transport.open(path)?;

        let remote = self.options.remote_name.as_str();
        local.add_mirror_remote(remote, destination_url)?;
        self.events.emit(&MigrationEvent::RemoteAdded {
            name: remote.to_string(),
            url: destination_url.to_string(),
        });

        let destination: &RepoDescriptor = destination;
        let created = self.ensure_destination(destination, destination_url).await?;

        if let Err(e) = local.push(
            remote,
            &MIRROR_PUSH_REFSPECS,
            true,
            destination.credentials(),
        ) {
            if created && self.options.delete_created_on_push_failure {
                self.compensate(destination, destination_url).await;
            }
            return Err(e);
        }

        self.events.emit(&MigrationEvent::PushComplete {
            url: destination_url.to_string(),
        });
        Ok(())
    }

    /// Create the destination when its hub reports it absent
    ///
    /// Returns whether a repository was created. Destinations without a hub
    /// are assumed to exist.
    async fn ensure_destination(
        &self,
        destination: &RepoDescriptor,
        url: &str,
    ) -> Result<bool> {
        let Some(hub) = destination.hub().cloned() else {
            debug!(url, "No hosting provider for destination, skipping existence check");
            return Ok(false);
        };

        if hub.repository_exists(destination).await? {
            debug!(url, "Destination repository exists");
            return Ok(false);
        }

        self.events.emit(&MigrationEvent::DestinationMissing {
            url: url.to_string(),
        });
        self.events.emit(&MigrationEvent::CreateAttempted {
            url: url.to_string(),
        });
        hub.repository_create(destination).await?;
        self.events.emit(&MigrationEvent::DestinationCreated {
            url: url.to_string(),
        });

        Ok(true)
    }

    async fn compensate(&self, destination: &RepoDescriptor, url: &str) {
        let Some(hub) = destination.hub().cloned() else {
            return;
        };

        self.events.emit(&MigrationEvent::CompensatingDelete {
            url: url.to_string(),
        });
        if let Err(e) = hub.repository_delete(destination).await {
            warn!(url, error = %e, "Failed to delete destination repository after push failure");
        }
    }

    fn cleanup(&self, path: &Path) {
        if !path.exists() {
            return;
        }

        let removed = match std::fs::remove_dir_all(path) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove working directory");
                false
            }
        };

        self.events.emit(&MigrationEvent::CleanupComplete {
            path: path.to_path_buf(),
            removed,
        });
    }
}
