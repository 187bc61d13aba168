//! Working-directory layout.
//!
//! ```text
//! <work_dir>/
//!   forksync.log          (append-only run log)
//!   <repo>/               (one clone per repository name)
//!     .forksync-skip      (zero-byte marker, only after a failed run)
//! ```
//!
//! All helpers here are pure except [`ensure_work_dir`] and [`write_skip_marker`].

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{io_err, ConfigError};
use crate::types::RepoName;

/// `<work_dir>/<repo>/`
pub fn repo_dir(config: &Config, repo: &RepoName) -> PathBuf {
    config.work_dir.join(&repo.0)
}

/// `<work_dir>/<repo>/<skip_marker>`
pub fn skip_marker_path(config: &Config, repo: &RepoName) -> PathBuf {
    repo_dir(config, repo).join(&config.skip_marker)
}

/// Whether `<work_dir>/<repo>/` holds a git checkout of its own.
///
/// A bare directory (for example one left behind by a failed clone's skip
/// marker) is not a checkout, and git commands run inside it would resolve
/// to whatever repository encloses the working directory.
pub fn is_checkout(config: &Config, repo: &RepoName) -> bool {
    repo_dir(config, repo).join(".git").exists()
}

/// `<work_dir>/<log_file>`
pub fn log_path(config: &Config) -> PathBuf {
    config.work_dir.join(&config.log_file)
}

/// Whether a prior run quarantined this repository.
pub fn has_skip_marker(config: &Config, repo: &RepoName) -> bool {
    skip_marker_path(config, repo).is_file()
}

/// Create the zero-byte skip marker, creating the repository directory if the
/// failure happened before anything was cloned.
pub fn write_skip_marker(config: &Config, repo: &RepoName) -> Result<PathBuf, ConfigError> {
    let dir = repo_dir(config, repo);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
    let marker = skip_marker_path(config, repo);
    std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&marker)
        .map_err(|e| io_err(&marker, e))?;
    Ok(marker)
}

/// Create the working-directory root if it does not yet exist.
pub fn ensure_work_dir(work_dir: &Path) -> Result<(), ConfigError> {
    if !work_dir.exists() {
        std::fs::create_dir_all(work_dir).map_err(|e| io_err(work_dir, e))?;
    }
    Ok(())
}
