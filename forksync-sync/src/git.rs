//! [`VcsClient`] backed by the git command-line client.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Output;

use forksync_core::BranchName;

use crate::client::VcsClient;
use crate::command;
use crate::error::SyncError;

/// Shells out to `git -C <dir> …`.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn argv<'a>(dir: &'a Path, args: &[&'a str]) -> Vec<&'a OsStr> {
        let mut argv = vec![OsStr::new("-C"), dir.as_os_str()];
        argv.extend(args.iter().map(|a| OsStr::new(*a)));
        argv
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, SyncError> {
        command::checked(&self.program, &Self::argv(dir, args))
    }

    fn probe(&self, dir: &Path, args: &[&str]) -> Result<Output, SyncError> {
        command::output(&self.program, &Self::argv(dir, args))
    }
}

impl VcsClient for GitCli {
    fn fetch_all(&self, dir: &Path) -> Result<(), SyncError> {
        self.run(dir, &["fetch", "--all", "--prune"]).map(|_| ())
    }

    fn local_branch_exists(&self, dir: &Path, branch: &BranchName) -> Result<bool, SyncError> {
        let refname = format!("refs/heads/{}", branch);
        let out = self.probe(dir, &["show-ref", "--verify", "--quiet", refname.as_str()])?;
        Ok(out.status.success())
    }

    fn checkout(&self, dir: &Path, branch: &BranchName) -> Result<(), SyncError> {
        self.run(dir, &["checkout", branch.as_str()]).map(|_| ())
    }

    fn create_branch(&self, dir: &Path, branch: &BranchName) -> Result<(), SyncError> {
        self.run(dir, &["checkout", "-b", branch.as_str()]).map(|_| ())
    }

    fn pull(&self, dir: &Path, remote: &str, branch: &BranchName) -> Result<(), SyncError> {
        self.run(dir, &["pull", remote, branch.as_str()]).map(|_| ())
    }

    fn push(
        &self,
        dir: &Path,
        remote: &str,
        branch: &BranchName,
        dest: &BranchName,
        set_upstream: bool,
    ) -> Result<(), SyncError> {
        let refspec = format!("{}:{}", branch, dest);
        let mut args = vec!["push"];
        if set_upstream {
            args.push("-u");
        }
        args.push(remote);
        args.push(refspec.as_str());
        self.run(dir, &args).map(|_| ())
    }

    fn remote_exists(&self, dir: &Path, name: &str) -> Result<bool, SyncError> {
        let stdout = self.run(dir, &["remote"])?;
        Ok(stdout.lines().any(|line| line.trim() == name))
    }

    fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<(), SyncError> {
        self.run(dir, &["remote", "add", name, url]).map(|_| ())
    }

    fn set_remote_url(&self, dir: &Path, name: &str, url: &str) -> Result<(), SyncError> {
        self.run(dir, &["remote", "set-url", name, url]).map(|_| ())
    }
}
