//! Target-branch reconciliation inside one repository working directory.

use std::path::Path;

use forksync_core::BranchName;

use crate::client::VcsClient;
use crate::error::SyncError;
use crate::retry::Retrier;

pub const ORIGIN: &str = "origin";

/// What reconciliation did to the branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    /// Existing local branch checked out and pulled from origin.
    Updated,
    /// Existing local branch checked out; the pull failed and the local tip is kept.
    Stale,
    /// Branch did not exist locally; created at HEAD and pushed to origin.
    Created,
}

/// Ensure `branch` is checked out in `dir` and tracks origin.
///
/// A pull failure only downgrades the result to [`BranchState::Stale`].
/// Checkout failures and an exhausted push on creation are errors.
pub fn reconcile(
    vcs: &dyn VcsClient,
    retrier: &Retrier<'_>,
    dir: &Path,
    branch: &BranchName,
) -> Result<BranchState, SyncError> {
    if vcs.local_branch_exists(dir, branch)? {
        vcs.checkout(dir, branch)?;
        return match vcs.pull(dir, ORIGIN, branch) {
            Ok(()) => {
                tracing::debug!(%branch, "pulled from origin");
                Ok(BranchState::Updated)
            }
            Err(err) => {
                tracing::warn!(%branch, error = %err, "pull from origin failed, keeping local state");
                Ok(BranchState::Stale)
            }
        };
    }

    tracing::info!(%branch, "creating branch and publishing to origin");
    vcs.create_branch(dir, branch)?;
    retrier.run(&format!("push {ORIGIN} {branch}"), || {
        vcs.push(dir, ORIGIN, branch, branch, true)
    })?;
    Ok(BranchState::Created)
}
