//! Narrow interfaces to the two external collaborators.
//!
//! The pipeline only ever talks to the hosting service and the version-control
//! client through these traits. [`crate::gh::GhCli`] and [`crate::git::GitCli`]
//! shell out to the real tools; [`crate::fake`] records calls for tests.
//!
//! Every VCS operation takes the repository directory explicitly. Nothing in
//! this crate changes the process-wide current directory.

use std::path::Path;

use forksync_core::{BranchName, OrgName, RepoName};

use crate::error::SyncError;

/// Source-control hosting operations (GitHub via `gh`).
pub trait HostingClient {
    /// Succeeds only when the current session is authenticated.
    fn auth_status(&self) -> Result<(), SyncError>;

    /// Repository names under `org`, at most `limit`, in listing order.
    fn list_repos(&self, org: &OrgName, limit: u32) -> Result<Vec<RepoName>, SyncError>;

    /// Clone `org/repo` into `dest`.
    fn clone_repo(&self, org: &OrgName, repo: &RepoName, dest: &Path) -> Result<(), SyncError>;

    /// Whether `org/repo` exists and is visible to the session.
    fn repo_exists(&self, org: &OrgName, repo: &RepoName) -> Result<bool, SyncError>;

    /// Fork `org/repo` into `into` without cloning it locally.
    fn fork_repo(&self, org: &OrgName, repo: &RepoName, into: &OrgName) -> Result<(), SyncError>;

    /// Network location used for a remote pointing at `org/repo`.
    fn repo_url(&self, org: &OrgName, repo: &RepoName) -> String {
        format!("https://github.com/{}/{}.git", org, repo)
    }
}

/// Version-control operations (git), always scoped to an explicit directory.
pub trait VcsClient {
    /// Fetch every remote, pruning deleted refs.
    fn fetch_all(&self, dir: &Path) -> Result<(), SyncError>;

    /// Whether `refs/heads/<branch>` exists locally.
    fn local_branch_exists(&self, dir: &Path, branch: &BranchName) -> Result<bool, SyncError>;

    /// Check out an existing local branch.
    fn checkout(&self, dir: &Path, branch: &BranchName) -> Result<(), SyncError>;

    /// Create `branch` at the current checkout position and switch to it.
    fn create_branch(&self, dir: &Path, branch: &BranchName) -> Result<(), SyncError>;

    /// Pull `branch` from `remote` into the current checkout.
    fn pull(&self, dir: &Path, remote: &str, branch: &BranchName) -> Result<(), SyncError>;

    /// Push local `branch` to `remote` as `dest`.
    fn push(
        &self,
        dir: &Path,
        remote: &str,
        branch: &BranchName,
        dest: &BranchName,
        set_upstream: bool,
    ) -> Result<(), SyncError>;

    /// Whether a remote called `name` is configured.
    fn remote_exists(&self, dir: &Path, name: &str) -> Result<bool, SyncError>;

    fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<(), SyncError>;

    fn set_remote_url(&self, dir: &Path, name: &str, url: &str) -> Result<(), SyncError>;
}
