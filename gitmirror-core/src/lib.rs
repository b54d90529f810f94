//! gitmirror core - repository migration between git hosting providers
//!
//! A migration takes a source and a destination [`RepoDescriptor`]. When both
//! are managed by the same [`Hub`] domain the provider forks the repository;
//! otherwise the [`MirrorPipeline`] mirror-clones the source and force-pushes
//! every branch and tag to the destination, creating it first if needed.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod git;
pub mod hub;
pub mod migrate;
pub mod pipeline;
pub mod repository;
pub mod secrets;

#[cfg(test)]
mod testing;

pub use auth::Credentials;
pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventSink, MigrationEvent, NullSink, RecordingSink, Strategy, TracingSink};
pub use git::{Git2Transport, GitTransport, LocalRepository, ParsedUrl};
pub use hub::Hub;
pub use migrate::{choose_strategy, simple_fork, simple_mirror_push, Migrator};
pub use pipeline::{MirrorPipeline, PipelineOptions, MIRROR_PUSH_REFSPECS, MIRROR_REMOTE_NAME};
pub use repository::{RepoDescriptor, Visibility};
pub use secrets::Secrets;
