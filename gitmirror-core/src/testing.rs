//! Test doubles for the hub and git transport seams

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::auth::Credentials;
use crate::git::{GitTransport, LocalRepository};
use crate::hub::Hub;
use crate::repository::RepoDescriptor;
use crate::{Error, Result};

/// A call made against [`StubHub`], keyed by `owner/name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubCall {
    Exists(String),
    Create(String),
    Fork(String, Option<String>),
    Delete(String),
}

/// In-memory hub that records calls
#[derive(Debug)]
pub struct StubHub {
    domain: String,
    exists: bool,
    fail_create: bool,
    calls: Mutex<Vec<HubCall>>,
}

impl StubHub {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            exists: false,
            fail_create: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_existing(mut self, exists: bool) -> Self {
        self.exists = exists;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn calls(&self) -> Vec<HubCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: HubCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Hub for StubHub {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn set_account(&self, _account: &str) {}

    fn set_password(&self, _password: &str) {}

    async fn repository_exists(&self, repo: &RepoDescriptor) -> Result<bool> {
        self.record(HubCall::Exists(repo.full_name()));
        Ok(self.exists)
    }

    async fn repository_create(&self, repo: &RepoDescriptor) -> Result<()> {
        self.record(HubCall::Create(repo.full_name()));
        if self.fail_create {
            return Err(Error::Other("create refused".to_string()));
        }
        Ok(())
    }

    async fn repository_fork(
        &self,
        source: &RepoDescriptor,
        destination: Option<&RepoDescriptor>,
    ) -> Result<()> {
        self.record(HubCall::Fork(
            source.full_name(),
            destination.map(RepoDescriptor::full_name),
        ));
        Ok(())
    }

    async fn repository_delete(&self, repo: &RepoDescriptor) -> Result<()> {
        self.record(HubCall::Delete(repo.full_name()));
        Ok(())
    }
}

/// A push submitted to [`StubTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRecord {
    pub remote: String,
    pub refspecs: Vec<String>,
    pub force: bool,
}

#[derive(Debug, Default)]
struct TransportLog {
    clones: Vec<(String, PathBuf)>,
    remotes: Vec<(String, String)>,
    pushes: Vec<PushRecord>,
}

/// Transport that fakes a clone by creating the directory
#[derive(Debug, Default)]
pub struct StubTransport {
    fail_clone: bool,
    fail_push: bool,
    log: Arc<Mutex<TransportLog>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_clone(mut self) -> Self {
        self.fail_clone = true;
        self
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn clones(&self) -> Vec<(String, PathBuf)> {
        self.log.lock().unwrap().clones.clone()
    }

    pub fn remotes(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().remotes.clone()
    }

    pub fn pushes(&self) -> Vec<PushRecord> {
        self.log.lock().unwrap().pushes.clone()
    }
}

impl GitTransport for StubTransport {
    fn mirror_clone(
        &self,
        url: &str,
        path: &Path,
        _credentials: Option<&Credentials>,
    ) -> Result<()> {
        if self.fail_clone {
            return Err(Error::Git(git2::Error::from_str("clone refused")));
        }
        std::fs::create_dir_all(path)?;
        std::fs::write(path.join("HEAD"), "ref: refs/heads/main\n")?;
        self.log
            .lock()
            .unwrap()
            .clones
            .push((url.to_string(), path.to_path_buf()));
        Ok(())
    }

    fn open(&self, path: &Path) -> Result<Box<dyn LocalRepository>> {
        if !path.exists() {
            return Err(Error::Config(format!("Not a git repository: {}", path.display())));
        }
        Ok(Box::new(StubLocal {
            fail_push: self.fail_push,
            log: self.log.clone(),
        }))
    }
}

struct StubLocal {
    fail_push: bool,
    log: Arc<Mutex<TransportLog>>,
}

impl LocalRepository for StubLocal {
    fn add_mirror_remote(&self, name: &str, url: &str) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .remotes
            .push((name.to_string(), url.to_string()));
        Ok(())
    }

    fn push(
        &self,
        remote: &str,
        refspecs: &[&str],
        force: bool,
        _credentials: Option<&Credentials>,
    ) -> Result<()> {
        self.log.lock().unwrap().pushes.push(PushRecord {
            remote: remote.to_string(),
            refspecs: refspecs.iter().map(|s| s.to_string()).collect(),
            force,
        });
        if self.fail_push {
            return Err(Error::Git(git2::Error::from_str("push rejected")));
        }
        Ok(())
    }
}

/// Bare repository with `main`, `dev` and a `v1` tag at `dir/source.git`
pub fn seed_bare_repository(dir: &Path) -> PathBuf {
    let path = dir.join("source.git");
    let repo = git2::Repository::init_bare(&path).unwrap();
    let sig = git2::Signature::now("Test", "test@example.com").unwrap();

    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let main = repo
        .commit(Some("refs/heads/main"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
    let main = repo.find_commit(main).unwrap();
    repo.commit(Some("refs/heads/dev"), &sig, &sig, "dev work", &tree, &[&main])
        .unwrap();
    repo.tag_lightweight("v1", main.as_object(), false).unwrap();
    repo.set_head("refs/heads/main").unwrap();

    path
}
