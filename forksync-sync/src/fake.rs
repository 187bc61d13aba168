//! Recording in-memory collaborators for deterministic tests.
//!
//! [`FakeHosting`] and [`FakeVcs`] implement the client traits without any
//! network access. Every call is appended to a log (`"clone acme/r1"`, …) so
//! tests can assert exactly which operations ran. Failures are injected per
//! repository or per operation with a remaining-count, where `u32::MAX` means
//! "always fail".
//!
//! `clone_repo` creates `<dest>/.git` on disk so the pipeline's checkout
//! detection and skip markers behave as with a real clone.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use forksync_core::{BranchName, OrgName, RepoName};

use crate::client::{HostingClient, VcsClient};
use crate::error::SyncError;
use crate::retry::Sleeper;

pub const ALWAYS: u32 = u32::MAX;

fn injected(program: &str, args: String) -> SyncError {
    SyncError::Command {
        program: program.to_string(),
        args,
        status: "exit status: 1".to_string(),
        stderr: "injected failure".to_string(),
    }
}

/// Decrement a remaining-failures counter; `true` means this call fails.
fn take_failure(counters: &RefCell<HashMap<String, u32>>, key: &str) -> bool {
    let mut counters = counters.borrow_mut();
    match counters.get_mut(key) {
        Some(0) | None => false,
        Some(n) => {
            if *n != ALWAYS {
                *n -= 1;
            }
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Sleeper
// ---------------------------------------------------------------------------

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.delays.borrow_mut().push(delay);
    }
}

// ---------------------------------------------------------------------------
// Hosting
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeHosting {
    unauthenticated: bool,
    listings: HashMap<OrgName, Result<Vec<RepoName>, String>>,
    existing: RefCell<HashSet<String>>,
    clone_failures: RefCell<HashMap<String, u32>>,
    fork_failures: RefCell<HashMap<String, u32>>,
    calls: RefCell<Vec<String>>,
}

impl FakeHosting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unauthenticated(mut self) -> Self {
        self.unauthenticated = true;
        self
    }

    pub fn with_repos(mut self, org: &str, repos: &[&str]) -> Self {
        let repos = repos.iter().map(|r| RepoName::from(*r)).collect();
        self.listings.insert(OrgName::from(org), Ok(repos));
        self
    }

    pub fn with_listing_error(mut self, org: &str, message: &str) -> Self {
        self.listings
            .insert(OrgName::from(org), Err(message.to_string()));
        self
    }

    /// Mark `org/repo` as already present (e.g. an existing fork).
    pub fn with_existing(self, org: &str, repo: &str) -> Self {
        self.existing.borrow_mut().insert(format!("{org}/{repo}"));
        self
    }

    pub fn fail_clone(self, org: &str, repo: &str, times: u32) -> Self {
        self.clone_failures
            .borrow_mut()
            .insert(format!("{org}/{repo}"), times);
        self
    }

    pub fn fail_fork(self, org: &str, repo: &str, times: u32) -> Self {
        self.fork_failures
            .borrow_mut()
            .insert(format!("{org}/{repo}"), times);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Calls that change state on the hosting side or on disk.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("clone ") || c.starts_with("fork "))
            .collect()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl HostingClient for FakeHosting {
    fn auth_status(&self) -> Result<(), SyncError> {
        self.record("auth".to_string());
        if self.unauthenticated {
            return Err(SyncError::NotAuthenticated(
                "You are not logged into any GitHub hosts".to_string(),
            ));
        }
        Ok(())
    }

    fn list_repos(&self, org: &OrgName, limit: u32) -> Result<Vec<RepoName>, SyncError> {
        self.record(format!("list {org} {limit}"));
        match self.listings.get(org) {
            Some(Ok(repos)) => Ok(repos.iter().take(limit as usize).cloned().collect()),
            Some(Err(message)) => Err(SyncError::Command {
                program: "gh".to_string(),
                args: format!("repo list {org}"),
                status: "exit status: 1".to_string(),
                stderr: message.clone(),
            }),
            None => Ok(vec![]),
        }
    }

    fn clone_repo(&self, org: &OrgName, repo: &RepoName, dest: &Path) -> Result<(), SyncError> {
        let slug = repo.slug(org);
        self.record(format!("clone {slug}"));
        if take_failure(&self.clone_failures, &slug) {
            return Err(injected("gh", format!("repo clone {slug}")));
        }
        let git_dir = dest.join(".git");
        std::fs::create_dir_all(&git_dir).map_err(|e| crate::error::io_err(&git_dir, e))?;
        Ok(())
    }

    fn repo_exists(&self, org: &OrgName, repo: &RepoName) -> Result<bool, SyncError> {
        let slug = repo.slug(org);
        self.record(format!("view {slug}"));
        Ok(self.existing.borrow().contains(&slug))
    }

    fn fork_repo(&self, org: &OrgName, repo: &RepoName, into: &OrgName) -> Result<(), SyncError> {
        let slug = repo.slug(org);
        self.record(format!("fork {slug} -> {into}"));
        if take_failure(&self.fork_failures, &slug) {
            return Err(injected("gh", format!("repo fork {slug}")));
        }
        self.existing.borrow_mut().insert(repo.slug(into));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// VCS
// ---------------------------------------------------------------------------

/// One recorded push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRecord {
    pub dir: PathBuf,
    pub remote: String,
    pub branch: BranchName,
    pub dest: BranchName,
}

#[derive(Debug, Default)]
pub struct FakeVcs {
    branches: RefCell<HashMap<PathBuf, HashSet<String>>>,
    remotes: RefCell<HashMap<PathBuf, HashMap<String, String>>>,
    failures: RefCell<HashMap<String, u32>>,
    pushes: RefCell<Vec<PushRecord>>,
    calls: RefCell<Vec<String>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `branch` already exists locally in `dir`.
    pub fn with_branch(self, dir: &Path, branch: &str) -> Self {
        self.branches
            .borrow_mut()
            .entry(dir.to_path_buf())
            .or_default()
            .insert(branch.to_string());
        self
    }

    pub fn with_remote(self, dir: &Path, name: &str, url: &str) -> Self {
        self.remotes
            .borrow_mut()
            .entry(dir.to_path_buf())
            .or_default()
            .insert(name.to_string(), url.to_string());
        self
    }

    /// Fail the named operation (`"fetch"`, `"checkout"`, `"pull"`, `"push"`,
    /// `"remote"`) the given number of times, across all directories.
    pub fn fail(self, op: &str, times: u32) -> Self {
        self.failures.borrow_mut().insert(op.to_string(), times);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn pushes(&self) -> Vec<PushRecord> {
        self.pushes.borrow().clone()
    }

    pub fn remote_url(&self, dir: &Path, name: &str) -> Option<String> {
        self.remotes
            .borrow()
            .get(dir)
            .and_then(|r| r.get(name).cloned())
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn check(&self, op: &str, args: String) -> Result<(), SyncError> {
        if take_failure(&self.failures, op) {
            return Err(injected("git", args));
        }
        Ok(())
    }
}

impl VcsClient for FakeVcs {
    fn fetch_all(&self, dir: &Path) -> Result<(), SyncError> {
        self.record(format!("fetch {}", dir.display()));
        self.check("fetch", "fetch --all --prune".to_string())
    }

    fn local_branch_exists(&self, dir: &Path, branch: &BranchName) -> Result<bool, SyncError> {
        self.record(format!("show-ref {branch}"));
        Ok(self
            .branches
            .borrow()
            .get(dir)
            .is_some_and(|b| b.contains(branch.as_str())))
    }

    fn checkout(&self, _dir: &Path, branch: &BranchName) -> Result<(), SyncError> {
        self.record(format!("checkout {branch}"));
        self.check("checkout", format!("checkout {branch}"))
    }

    fn create_branch(&self, dir: &Path, branch: &BranchName) -> Result<(), SyncError> {
        self.record(format!("checkout -b {branch}"));
        self.check("checkout", format!("checkout -b {branch}"))?;
        self.branches
            .borrow_mut()
            .entry(dir.to_path_buf())
            .or_default()
            .insert(branch.0.clone());
        Ok(())
    }

    fn pull(&self, _dir: &Path, remote: &str, branch: &BranchName) -> Result<(), SyncError> {
        self.record(format!("pull {remote} {branch}"));
        self.check("pull", format!("pull {remote} {branch}"))
    }

    fn push(
        &self,
        dir: &Path,
        remote: &str,
        branch: &BranchName,
        dest: &BranchName,
        set_upstream: bool,
    ) -> Result<(), SyncError> {
        let flag = if set_upstream { "-u " } else { "" };
        self.record(format!("push {flag}{remote} {branch}:{dest}"));
        self.check("push", format!("push {remote} {branch}:{dest}"))?;
        self.pushes.borrow_mut().push(PushRecord {
            dir: dir.to_path_buf(),
            remote: remote.to_string(),
            branch: branch.clone(),
            dest: dest.clone(),
        });
        Ok(())
    }

    fn remote_exists(&self, dir: &Path, name: &str) -> Result<bool, SyncError> {
        self.record(format!("remote {name}?"));
        Ok(self
            .remotes
            .borrow()
            .get(dir)
            .is_some_and(|r| r.contains_key(name)))
    }

    fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<(), SyncError> {
        self.record(format!("remote add {name} {url}"));
        self.check("remote", format!("remote add {name} {url}"))?;
        self.remotes
            .borrow_mut()
            .entry(dir.to_path_buf())
            .or_default()
            .insert(name.to_string(), url.to_string());
        Ok(())
    }

    fn set_remote_url(&self, dir: &Path, name: &str, url: &str) -> Result<(), SyncError> {
        self.record(format!("remote set-url {name} {url}"));
        self.check("remote", format!("remote set-url {name} {url}"))?;
        self.remotes
            .borrow_mut()
            .entry(dir.to_path_buf())
            .or_default()
            .insert(name.to_string(), url.to_string());
        Ok(())
    }
}
