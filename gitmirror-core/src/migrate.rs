//! Migration orchestrator
//!
//! Picks between a provider-side fork and a mirror push, then runs it.

use std::sync::Arc;

use tracing::debug;

use crate::auth::Credentials;
use crate::events::{EventSink, MigrationEvent, Strategy, TracingSink};
use crate::git::{Git2Transport, GitTransport};
use crate::hub::Hub;
use crate::pipeline::{MirrorPipeline, PipelineOptions};
use crate::repository::RepoDescriptor;
use crate::{Error, Result};

/// Decide how `source` reaches `destination`
///
/// Fork when both sides have a hub with the same domain, mirror push
/// otherwise.
pub fn choose_strategy(source: &RepoDescriptor, destination: &RepoDescriptor) -> Strategy {
    match (source.hub(), destination.hub()) {
        (Some(from), Some(to)) if from.domain() == to.domain() => Strategy::Fork,
        _ => Strategy::MirrorPush,
    }
}

/// Runs migrations between repository descriptors
///
/// Holds no per-migration state; one `Migrator` can run any number of
/// migrations as long as concurrent runs use distinct working directories.
pub struct Migrator {
    transport: Arc<dyn GitTransport>,
    events: Arc<dyn EventSink>,
    options: PipelineOptions,
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Migrator {
    /// libgit2 transport, events forwarded to `tracing`, default options
    pub fn new() -> Self {
        Self {
            transport: Arc::new(Git2Transport::new()),
            events: Arc::new(TracingSink),
            options: PipelineOptions::default(),
        }
    }

    /// Use a different git transport
    pub fn with_transport(mut self, transport: Arc<dyn GitTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Send events somewhere else
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Replace pipeline options
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Migrate `source` to `destination` using whichever strategy applies
    pub async fn migrate(
        &self,
        source: &RepoDescriptor,
        destination: &mut RepoDescriptor,
    ) -> Result<()> {
        self.events.emit(&MigrationEvent::Started {
            source: label(source),
            destination: label(destination),
        });

        let strategy = choose_strategy(source, destination);
        self.events.emit(&MigrationEvent::StrategyChosen(strategy));

        match strategy {
            Strategy::Fork => self.fork_inner(source, Some(&*destination)).await,
            Strategy::MirrorPush => self.pipeline().run(source, destination).await,
        }
    }

    /// Fork `source` through its hub
    ///
    /// Without a destination the fork lands in the authenticated account.
    pub async fn fork(
        &self,
        source: &RepoDescriptor,
        destination: Option<&RepoDescriptor>,
    ) -> Result<()> {
        self.events.emit(&MigrationEvent::Started {
            source: label(source),
            destination: destination.map(label).unwrap_or_default(),
        });
        self.events
            .emit(&MigrationEvent::StrategyChosen(Strategy::Fork));
        self.fork_inner(source, destination).await
    }

    /// Mirror-push `source` to `destination` regardless of their hubs
    pub async fn mirror_push(
        &self,
        source: &RepoDescriptor,
        destination: &mut RepoDescriptor,
    ) -> Result<()> {
        self.events.emit(&MigrationEvent::Started {
            source: label(source),
            destination: label(destination),
        });
        self.events
            .emit(&MigrationEvent::StrategyChosen(Strategy::MirrorPush));
        self.pipeline().run(source, destination).await
    }

    async fn fork_inner(
        &self,
        source: &RepoDescriptor,
        destination: Option<&RepoDescriptor>,
    ) -> Result<()> {
        let hub = source.hub().ok_or_else(|| {
            Error::Config(format!(
                "Cannot fork {}: no hosting provider attached",
                source.full_name()
            ))
        })?;

        debug!(
            source = %source.full_name(),
            destination = ?destination.map(RepoDescriptor::full_name),
            "Requesting fork"
        );
        hub.repository_fork(source, destination).await
    }

    fn pipeline(&self) -> MirrorPipeline {
        MirrorPipeline::new(
            self.transport.clone(),
            self.events.clone(),
            self.options.clone(),
        )
    }
}

fn label(repo: &RepoDescriptor) -> String {
    repo.url().unwrap_or_else(|_| repo.full_name())
}

/// Fork `url` into the account `hub` is authenticated as
pub async fn simple_fork(hub: Arc<dyn Hub>, url: &str) -> Result<()> {
    let source = RepoDescriptor::parse(url)?.with_hub(hub);
    Migrator::new().fork(&source, None).await
}

/// Mirror-push `from_url` to `to_url`, creating the destination through
/// `to_hub` when it is missing
pub async fn simple_mirror_push(
    from_url: &str,
    to_url: &str,
    to_hub: Option<Arc<dyn Hub>>,
    to_credentials: Option<Credentials>,
) -> Result<()> {
    let source = RepoDescriptor::parse(from_url)?;
    let mut destination = RepoDescriptor::parse(to_url)?.with_credentials(to_credentials);
    destination.set_hub(to_hub);
    Migrator::new().mirror_push(&source, &mut destination).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NullSink, RecordingSink};
    use crate::testing::{seed_bare_repository, HubCall, StubHub, StubTransport};
    use tempfile::TempDir;

    fn migrator(transport: Arc<StubTransport>, dir: &TempDir) -> (Migrator, Arc<RecordingSink>) {
        let events = Arc::new(RecordingSink::new());
        let migrator = Migrator::new()
            .with_transport(transport)
            .with_events(events.clone())
            .with_options(PipelineOptions {
                work_dir: Some(dir.path().to_path_buf()),
                ..PipelineOptions::default()
            });
        (migrator, events)
    }

    #[test]
    fn test_same_domain_chooses_fork() {
        let source = RepoDescriptor::parse("https://github.com/pkg6/gitmirror.git")
            .unwrap()
            .with_hub(Arc::new(StubHub::new("github.com")));
        let destination = RepoDescriptor::parse("git@github.com:me/gitmirror.git")
            .unwrap()
            .with_hub(Arc::new(StubHub::new("github.com")));

        assert_eq!(choose_strategy(&source, &destination), Strategy::Fork);
    }

    #[test]
    fn test_different_domain_or_missing_hub_chooses_mirror() {
        let github = RepoDescriptor::parse("https://github.com/pkg6/gitmirror.git")
            .unwrap()
            .with_hub(Arc::new(StubHub::new("github.com")));
        let gitlab = RepoDescriptor::parse("git@gitlab.com:me/gitmirror.git")
            .unwrap()
            .with_hub(Arc::new(StubHub::new("gitlab.com")));
        let bare = RepoDescriptor::parse("git@github.com:me/gitmirror.git").unwrap();

        assert_eq!(choose_strategy(&github, &gitlab), Strategy::MirrorPush);
        assert_eq!(choose_strategy(&github, &bare), Strategy::MirrorPush);
        assert_eq!(choose_strategy(&bare, &github), Strategy::MirrorPush);
    }

    #[tokio::test]
    async fn test_migrate_same_domain_forks() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(StubTransport::new());
        let (migrator, events) = migrator(transport.clone(), &dir);

        let source_hub = Arc::new(StubHub::new("github.com"));
        let source = RepoDescriptor::parse("https://github.com/pkg6/gitmirror.git")
            .unwrap()
            .with_hub(source_hub.clone());
        let mut destination = RepoDescriptor::parse("git@github.com:me/gitmirror.git")
            .unwrap()
            .with_hub(Arc::new(StubHub::new("github.com")));

        migrator.migrate(&source, &mut destination).await.unwrap();

        assert_eq!(
            source_hub.calls(),
            vec![HubCall::Fork(
                "pkg6/gitmirror".to_string(),
                Some("me/gitmirror".to_string())
            )]
        );
        assert!(transport.clones().is_empty());
        assert!(transport.pushes().is_empty());
        assert!(events
            .events()
            .contains(&MigrationEvent::StrategyChosen(Strategy::Fork)));
    }

    #[tokio::test]
    async fn test_migrate_cross_domain_mirrors() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(StubTransport::new());
        let (migrator, events) = migrator(transport.clone(), &dir);

        let source_hub = Arc::new(StubHub::new("github.com"));
        let destination_hub = Arc::new(StubHub::new("gitlab.com"));
        let source = RepoDescriptor::parse("https://github.com/pkg6/gitmirror.git")
            .unwrap()
            .with_hub(source_hub.clone());
        let mut destination = RepoDescriptor::parse("git@gitlab.com:me/gitmirror.git")
            .unwrap()
            .with_hub(destination_hub.clone());

        migrator.migrate(&source, &mut destination).await.unwrap();

        assert!(source_hub.calls().is_empty());
        assert_eq!(
            transport.clones(),
            vec![(
                "https://github.com/pkg6/gitmirror.git".to_string(),
                dir.path().join("gitmirror")
            )]
        );
        assert_eq!(transport.pushes().len(), 1);
        assert!(!dir.path().join("gitmirror").exists());

        let events = events.events();
        assert_eq!(
            events[1],
            MigrationEvent::StrategyChosen(Strategy::MirrorPush)
        );
        assert!(matches!(
            events.last(),
            Some(MigrationEvent::CleanupComplete { removed: true, .. })
        ));
    }

    #[tokio::test]
    async fn test_migrate_source_without_hub_mirrors() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(StubTransport::new());
        let (migrator, _) = migrator(transport.clone(), &dir);

        let source = RepoDescriptor::parse("https://github.com/pkg6/gitmirror.git").unwrap();
        let mut destination = RepoDescriptor::parse("git@github.com:me/gitmirror.git")
            .unwrap()
            .with_hub(Arc::new(StubHub::new("github.com")));

        migrator.migrate(&source, &mut destination).await.unwrap();
        assert_eq!(transport.pushes().len(), 1);
    }

    #[tokio::test]
    async fn test_fork_without_destination() {
        let dir = TempDir::new().unwrap();
        let (migrator, _) = migrator(Arc::new(StubTransport::new()), &dir);
        let hub = Arc::new(StubHub::new("github.com"));
        let source = RepoDescriptor::parse("https://github.com/pkg6/gitmirror.git")
            .unwrap()
            .with_hub(hub.clone());

        migrator.fork(&source, None).await.unwrap();
        assert_eq!(
            hub.calls(),
            vec![HubCall::Fork("pkg6/gitmirror".to_string(), None)]
        );
    }

    #[tokio::test]
    async fn test_fork_requires_hub() {
        let dir = TempDir::new().unwrap();
        let (migrator, _) = migrator(Arc::new(StubTransport::new()), &dir);
        let source = RepoDescriptor::parse("https://github.com/pkg6/gitmirror.git").unwrap();

        let err = migrator.fork(&source, None).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_simple_fork_rejects_bad_url() {
        let hub = Arc::new(StubHub::new("github.com"));
        let err = simple_fork(hub.clone(), "https://github.com/onlyname")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UrlFormat(_)));
        assert!(hub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mirror_between_local_repositories() {
        let dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let source_path = seed_bare_repository(dir.path());
        let destination_path = dir.path().join("destination.git");
        git2::Repository::init_bare(&destination_path).unwrap();

        let source = RepoDescriptor::parse(source_path.to_str().unwrap()).unwrap();
        let mut destination =
            RepoDescriptor::parse(destination_path.to_str().unwrap()).unwrap();

        Migrator::new()
            .with_events(Arc::new(NullSink))
            .with_options(PipelineOptions {
                work_dir: Some(work.path().to_path_buf()),
                ..PipelineOptions::default()
            })
            .migrate(&source, &mut destination)
            .await
            .unwrap();

        let pushed = git2::Repository::open(&destination_path).unwrap();
        assert!(pushed.find_reference("refs/heads/main").is_ok());
        assert!(pushed.find_reference("refs/heads/dev").is_ok());
        assert!(pushed.find_reference("refs/tags/v1").is_ok());
        assert!(!work.path().join("source").exists());
    }

    #[tokio::test]
    async fn test_simple_mirror_push_between_local_repositories() {
        let dir = TempDir::new().unwrap();
        let seeded = seed_bare_repository(dir.path());
        // Working clone lands in the current directory, keep its name unique
        let name = format!("simple-mirror-{}", std::process::id());
        let source_path = dir.path().join(format!("{}.git", name));
        std::fs::rename(&seeded, &source_path).unwrap();
        let destination_path = dir.path().join("destination.git");
        git2::Repository::init_bare(&destination_path).unwrap();

        simple_mirror_push(
            source_path.to_str().unwrap(),
            destination_path.to_str().unwrap(),
            None,
            None,
        )
        .await
        .unwrap();

        let pushed = git2::Repository::open(&destination_path).unwrap();
        let source = git2::Repository::open(&source_path).unwrap();
        for reference in ["refs/heads/main", "refs/heads/dev", "refs/tags/v1"] {
            assert_eq!(
                pushed.refname_to_id(reference).unwrap(),
                source.refname_to_id(reference).unwrap()
            );
        }
        assert!(!std::path::Path::new(&name).exists());
    }

    #[tokio::test]
    async fn test_simple_mirror_push_rejects_bad_url() {
        let err = simple_mirror_push("not-a-url", "https://github.com/a/b.git", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UrlFormat(_)));
    }
}
