//! Per-repository fork-and-push pipeline.
//!
//! ## Steps
//!
//! 1. Materialize: fetch an existing checkout, else clone (retried). A
//!    directory without `.git` is cloned into, never fetched.
//! 2. Reconcile the source's target branch ([`crate::branch::reconcile`]).
//! 3. Ensure the fork exists in the build organization (fork retried).
//! 4. Add or update the build remote.
//! 5. Push `<branch>:<destination_ref>` to the build remote (retried).
//!
//! The first failing step aborts the rest; the caller decides what a failure
//! means for the run.

use std::path::PathBuf;

use forksync_core::{paths, Config, RepoName, SourceTarget};

use crate::branch::{self, BranchState};
use crate::client::{HostingClient, VcsClient};
use crate::error::{io_err, SyncError};
use crate::retry::{Retrier, RetryPolicy, Sleeper};

/// What the pipeline did for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub dir: PathBuf,
    /// `true` when the repository was cloned this run, `false` when fetched.
    pub cloned: bool,
    pub branch: BranchState,
    /// `true` when the fork was created this run.
    pub forked: bool,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    hosting: &'a dyn HostingClient,
    vcs: &'a dyn VcsClient,
    retrier: Retrier<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        hosting: &'a dyn HostingClient,
        vcs: &'a dyn VcsClient,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            config,
            hosting,
            vcs,
            retrier: Retrier::new(RetryPolicy::new(config.retry_count), sleeper),
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn hosting(&self) -> &dyn HostingClient {
        self.hosting
    }

    /// Run every step for `repo` from `source`.
    pub fn run(&self, source: &SourceTarget, repo: &RepoName) -> Result<PipelineOutcome, SyncError> {
        let config = self.config;
        let dir = paths::repo_dir(config, repo);

        // 1. Materialize
        let cloned = if paths::is_checkout(config, repo) {
            tracing::debug!(dir = %dir.display(), "fetching existing working directory");
            self.vcs.fetch_all(&dir)?;
            false
        } else {
            std::fs::create_dir_all(&config.work_dir).map_err(|e| io_err(&config.work_dir, e))?;
            if dir.exists() {
                tracing::debug!(dir = %dir.display(), "directory is not a checkout, cloning into it");
            }
            let slug = repo.slug(&source.org);
            self.retrier.run(&format!("clone {slug}"), || {
                self.hosting.clone_repo(&source.org, repo, &dir)
            })?;
            true
        };

        // 2. Reconcile branch
        let branch_state = branch::reconcile(self.vcs, &self.retrier, &dir, &source.branch)?;

        // 3. Ensure fork
        let forked = if self.hosting.repo_exists(&config.build_org, repo)? {
            tracing::debug!(build_org = %config.build_org, "fork already exists");
            false
        } else {
            let slug = repo.slug(&source.org);
            self.retrier
                .run(&format!("fork {slug} into {}", config.build_org), || {
                    self.hosting.fork_repo(&source.org, repo, &config.build_org)
                })?;
            tracing::info!(build_org = %config.build_org, "fork created");
            true
        };

        // 4. Ensure build remote
        let url = self.hosting.repo_url(&config.build_org, repo);
        if self.vcs.remote_exists(&dir, &config.build_remote)? {
            self.vcs.set_remote_url(&dir, &config.build_remote, &url)?;
        } else {
            self.vcs.add_remote(&dir, &config.build_remote, &url)?;
        }

        // 5. Push onto the shared destination ref
        self.retrier.run(
            &format!(
                "push {} {}:{}",
                config.build_remote, source.branch, config.destination_ref
            ),
            || {
                self.vcs.push(
                    &dir,
                    &config.build_remote,
                    &source.branch,
                    &config.destination_ref,
                    false,
                )
            },
        )?;

        Ok(PipelineOutcome {
            dir,
            cloned,
            branch: branch_state,
            forked,
        })
    }

    /// Human-readable list of what [`Pipeline::run`] would do, for dry runs.
    ///
    /// Only inspects the local filesystem; never calls a collaborator.
    pub fn plan(&self, source: &SourceTarget, repo: &RepoName) -> Vec<String> {
        let config = self.config;
        let dir = paths::repo_dir(config, repo);
        let slug = repo.slug(&source.org);
        let materialize = if paths::is_checkout(config, repo) {
            format!("fetch --all --prune in {}", dir.display())
        } else {
            format!("clone {slug} into {}", dir.display())
        };
        vec![
            materialize,
            format!("reconcile branch {} with origin", source.branch),
            format!("fork {slug} into {} unless it exists", config.build_org),
            format!(
                "point remote '{}' at {}",
                config.build_remote,
                self.hosting.repo_url(&config.build_org, repo)
            ),
            format!(
                "push {} to {}:{}",
                source.branch, config.build_remote, config.destination_ref
            ),
        ]
    }
}
