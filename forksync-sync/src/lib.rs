//! # forksync-sync
//!
//! Collaborator clients, retry executor, and the mirroring workflow.
//!
//! Call [`run::run`] to check authentication and process every configured
//! source organization, or [`org::process_org`] / [`pipeline::Pipeline`] to
//! drive a narrower slice.

pub mod branch;
pub mod client;
mod command;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod gh;
pub mod git;
pub mod org;
pub mod pipeline;
pub mod retry;
pub mod run;

pub use client::{HostingClient, VcsClient};
pub use error::SyncError;
pub use gh::GhCli;
pub use git::GitCli;
pub use org::{OrgReport, RepoFailure};
pub use retry::{Retrier, RetryPolicy, Sleeper, ThreadSleeper};
pub use run::RunReport;
