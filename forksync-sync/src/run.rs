//! Shared run entrypoint: authentication precondition, then every source
//! organization in configuration order.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use forksync_core::Config;

use crate::client::{HostingClient, VcsClient};
use crate::error::SyncError;
use crate::org::{process_org, OrgReport};
use crate::pipeline::Pipeline;
use crate::retry::Sleeper;

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub orgs: Vec<OrgReport>,
    pub interrupted: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.interrupted && self.orgs.iter().all(OrgReport::is_success)
    }

    pub fn total_failed(&self) -> usize {
        self.orgs.iter().map(|o| o.failed).sum()
    }
}

/// Run the whole workflow once.
///
/// Returns `Err` only for the authentication precondition; everything after
/// that is reported per organization in the [`RunReport`].
pub fn run(
    config: &Config,
    hosting: &dyn HostingClient,
    vcs: &dyn VcsClient,
    sleeper: &dyn Sleeper,
    interrupt: &AtomicBool,
) -> Result<RunReport, SyncError> {
    hosting.auth_status()?;
    tracing::debug!("hosting session authenticated");

    let pipeline = Pipeline::new(config, hosting, vcs, sleeper);
    let mut report = RunReport {
        dry_run: config.dry_run,
        orgs: Vec::with_capacity(config.sources.len()),
        interrupted: false,
    };

    for source in &config.sources {
        if interrupt.load(Ordering::SeqCst) {
            report.interrupted = true;
            break;
        }
        let org_report = process_org(&pipeline, source, interrupt);
        let stop = org_report.interrupted;
        report.orgs.push(org_report);
        if stop {
            report.interrupted = true;
            break;
        }
    }

    // Ctrl-C during the final repository leaves no later check to observe it.
    report.interrupted |= interrupt.load(Ordering::SeqCst);

    Ok(report)
}
