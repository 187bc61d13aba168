//! Organization processor: list, then drive the pipeline per repository.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use forksync_core::{paths, BranchName, OrgName, RepoName, SourceTarget};

use crate::error::SyncError;
use crate::pipeline::Pipeline;

/// A repository whose pipeline failed this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoFailure {
    pub repo: RepoName,
    pub error: String,
}

/// Counts and failures for one source organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgReport {
    pub org: OrgName,
    pub branch: BranchName,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Set when the listing errored or was empty; no repository was touched.
    pub listing_error: Option<String>,
    /// Set when an interrupt stopped the loop early.
    pub interrupted: bool,
    pub failures: Vec<RepoFailure>,
}

impl OrgReport {
    fn new(source: &SourceTarget) -> Self {
        Self {
            org: source.org.clone(),
            branch: source.branch.clone(),
            processed: 0,
            failed: 0,
            skipped: 0,
            listing_error: None,
            interrupted: false,
            failures: vec![],
        }
    }

    pub fn is_success(&self) -> bool {
        self.listing_error.is_none() && self.failed == 0 && !self.interrupted
    }
}

/// Process every repository of `source` in listing order.
///
/// Failures are isolated per repository: each one is counted, quarantined with
/// a skip marker, and the loop moves on. `interrupt` is checked between
/// repositories; an in-flight pipeline always runs to completion.
pub fn process_org(
    pipeline: &Pipeline<'_>,
    source: &SourceTarget,
    interrupt: &AtomicBool,
) -> OrgReport {
    let config = pipeline.config();
    let mut report = OrgReport::new(source);

    tracing::info!(org = %source.org, branch = %source.branch, "processing organization");

    let repos = match list(pipeline, source) {
        Ok(repos) => repos,
        Err(err) => {
            tracing::error!(org = %source.org, error = %err, "repository listing failed");
            report.listing_error = Some(err.to_string());
            return report;
        }
    };
    tracing::info!(org = %source.org, count = repos.len(), "repositories listed");

    for repo in &repos {
        if interrupt.load(Ordering::SeqCst) {
            tracing::warn!(org = %source.org, "interrupted, stopping before {repo}");
            report.interrupted = true;
            break;
        }

        if paths::has_skip_marker(config, repo) {
            tracing::debug!(%repo, "skip marker present, skipping");
            report.skipped += 1;
            continue;
        }

        if config.dry_run {
            for action in pipeline.plan(source, repo) {
                tracing::info!(%repo, "[dry-run] would {action}");
            }
            report.processed += 1;
            continue;
        }

        tracing::info!(%repo, "syncing");
        match pipeline.run(source, repo) {
            Ok(outcome) => {
                tracing::info!(
                    %repo,
                    cloned = outcome.cloned,
                    forked = outcome.forked,
                    branch_state = ?outcome.branch,
                    "pushed {}:{}",
                    source.branch,
                    config.destination_ref
                );
                report.processed += 1;
            }
            Err(err) if interrupt.load(Ordering::SeqCst) => {
                // The child saw the same SIGINT; leave the repository unquarantined.
                tracing::warn!(%repo, error = %err, "interrupted during repository, not quarantining");
                report.interrupted = true;
                break;
            }
            Err(err) => {
                tracing::error!(%repo, error = %err, "repository failed, writing skip marker");
                report.failed += 1;
                report.failures.push(RepoFailure {
                    repo: repo.clone(),
                    error: err.to_string(),
                });
                if let Err(marker_err) = paths::write_skip_marker(config, repo) {
                    tracing::error!(%repo, error = %marker_err, "could not write skip marker");
                }
            }
        }
    }

    tracing::info!(
        org = %source.org,
        processed = report.processed,
        failed = report.failed,
        skipped = report.skipped,
        "organization done"
    );
    report
}

fn list(pipeline: &Pipeline<'_>, source: &SourceTarget) -> Result<Vec<RepoName>, SyncError> {
    let repos = pipeline
        .hosting()
        .list_repos(&source.org, pipeline.config().repo_limit)?;
    if repos.is_empty() {
        return Err(SyncError::EmptyListing {
            org: source.org.to_string(),
        });
    }
    Ok(repos)
}
