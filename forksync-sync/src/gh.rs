//! [`HostingClient`] backed by the GitHub CLI.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use forksync_core::{OrgName, RepoName};

use crate::client::HostingClient;
use crate::command;
use crate::error::SyncError;

/// Shells out to `gh`. The program path comes from configuration so tests and
/// unusual installs can point it elsewhere.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RepoEntry {
    name: String,
}

impl GhCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl HostingClient for GhCli {
    fn auth_status(&self) -> Result<(), SyncError> {
        let args = [OsStr::new("auth"), OsStr::new("status")];
        let out = command::output(&self.program, &args)?;
        if out.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
        Err(SyncError::NotAuthenticated(if stderr.is_empty() {
            out.status.to_string()
        } else {
            stderr
        }))
    }

    fn list_repos(&self, org: &OrgName, limit: u32) -> Result<Vec<RepoName>, SyncError> {
        let limit = limit.to_string();
        let args = [
            OsStr::new("repo"),
            OsStr::new("list"),
            OsStr::new(org.as_str()),
            OsStr::new("--limit"),
            OsStr::new(&limit),
            OsStr::new("--json"),
            OsStr::new("name"),
        ];
        let stdout = command::checked(&self.program, &args)?;
        parse_listing(&stdout)
    }

    fn clone_repo(&self, org: &OrgName, repo: &RepoName, dest: &Path) -> Result<(), SyncError> {
        let slug = repo.slug(org);
        let args = [
            OsStr::new("repo"),
            OsStr::new("clone"),
            OsStr::new(&slug),
            dest.as_os_str(),
        ];
        command::checked(&self.program, &args).map(|_| ())
    }

    fn repo_exists(&self, org: &OrgName, repo: &RepoName) -> Result<bool, SyncError> {
        let slug = repo.slug(org);
        let args = [
            OsStr::new("repo"),
            OsStr::new("view"),
            OsStr::new(&slug),
            OsStr::new("--json"),
            OsStr::new("name"),
        ];
        // `gh repo view` exits non-zero for a missing repository; only a
        // failure to launch `gh` is an error.
        Ok(command::output(&self.program, &args)?.status.success())
    }

    fn fork_repo(&self, org: &OrgName, repo: &RepoName, into: &OrgName) -> Result<(), SyncError> {
        let slug = repo.slug(org);
        let args = [
            OsStr::new("repo"),
            OsStr::new("fork"),
            OsStr::new(&slug),
            OsStr::new("--org"),
            OsStr::new(into.as_str()),
            OsStr::new("--clone=false"),
        ];
        command::checked(&self.program, &args).map(|_| ())
    }
}

/// Parse `gh repo list --json name` output, dropping blank names.
pub(crate) fn parse_listing(stdout: &str) -> Result<Vec<RepoName>, SyncError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(vec![]);
    }
    let entries: Vec<RepoEntry> = serde_json::from_str(trimmed)?;
    Ok(entries
        .into_iter()
        .map(|e| e.name)
        .filter(|n| !n.trim().is_empty())
        .map(RepoName::from)
        .collect())
}
