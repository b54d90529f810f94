//! Migration events
//!
//! The orchestrator and pipeline report progress as typed events instead of
//! logging directly, so embedders can assert on them, forward them or drop
//! them.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{info, warn};

/// How a migration is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Provider-side fork, both endpoints on the same hub
    Fork,
    /// Mirror clone followed by a forced mirror push
    MirrorPush,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Fork => f.write_str("fork"),
            Strategy::MirrorPush => f.write_str("mirror-push"),
        }
    }
}

/// Progress reported during a migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    /// A migration was requested
    Started {
        /// Source label
        source: String,
        /// Destination label
        destination: String,
    },
    /// The orchestrator picked a strategy
    StrategyChosen(Strategy),
    /// The source was mirror-cloned
    CloneComplete {
        /// Working directory of the clone
        path: PathBuf,
    },
    /// The mirror remote was registered
    RemoteAdded {
        /// Remote name
        name: String,
        /// Destination URL
        url: String,
    },
    /// The destination hub reported the repository absent
    DestinationMissing {
        /// Destination URL
        url: String,
    },
    /// Repository creation is about to be requested
    CreateAttempted {
        /// Destination URL
        url: String,
    },
    /// The destination repository was created
    DestinationCreated {
        /// Destination URL
        url: String,
    },
    /// All refs were pushed
    PushComplete {
        /// Destination URL
        url: String,
    },
    /// A repository created during this run is being deleted after a failed push
    CompensatingDelete {
        /// Destination URL
        url: String,
    },
    /// The working directory was removed (or removal failed)
    CleanupComplete {
        /// Working directory
        path: PathBuf,
        /// Whether removal succeeded
        removed: bool,
    },
}

/// Receiver for [`MigrationEvent`]s
pub trait EventSink: Send + Sync {
    /// Handle one event
    fn emit(&self, event: &MigrationEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &MigrationEvent) {
        match event {
            MigrationEvent::Started {
                source,
                destination,
            } => info!(%source, %destination, "Starting migration"),
            MigrationEvent::StrategyChosen(strategy) => info!(%strategy, "Strategy chosen"),
            MigrationEvent::CloneComplete { path } => {
                info!(path = %path.display(), "Clone completed")
            }
            MigrationEvent::RemoteAdded { name, url } => {
                info!(remote = %name, %url, "Mirror remote added")
            }
            MigrationEvent::DestinationMissing { url } => {
                info!(%url, "Destination repository does not exist")
            }
            MigrationEvent::CreateAttempted { url } => {
                info!(%url, "Creating destination repository")
            }
            MigrationEvent::DestinationCreated { url } => {
                info!(%url, "Destination repository created")
            }
            MigrationEvent::PushComplete { url } => info!(%url, "Mirror push completed"),
            MigrationEvent::CompensatingDelete { url } => {
                warn!(%url, "Deleting destination repository created by failed run")
            }
            MigrationEvent::CleanupComplete { path, removed } => {
                if *removed {
                    info!(path = %path.display(), "Working directory removed")
                } else {
                    warn!(path = %path.display(), "Failed to remove working directory")
                }
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &MigrationEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MigrationEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Events seen so far, in order
    pub fn events(&self) -> Vec<MigrationEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &MigrationEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
