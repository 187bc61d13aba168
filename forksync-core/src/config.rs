//! Run configuration.
//!
//! A [`Config`] is built once at startup from three layers, lowest first:
//!
//! 1. built-in defaults ([`Config::defaults_at`])
//! 2. an optional YAML file ([`ConfigFile`])
//! 3. command-line [`Overrides`]
//!
//! and is immutable for the rest of the run.
//!
//! # API pattern
//!
//! As with the path helpers, every function that needs the home directory has
//! an `_at(home: &Path, …)` form. Tests always use the `_at` form.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{BranchName, OrgName, SourceTarget};

pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const DEFAULT_REPO_LIMIT: u32 = 1000;
pub const DEFAULT_BUILD_REMOTE: &str = "build";
pub const DEFAULT_DESTINATION_REF: &str = "BUILD";
pub const DEFAULT_SKIP_MARKER: &str = ".forksync-skip";
pub const DEFAULT_LOG_FILE: &str = "forksync.log";

/// Immutable configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Source organizations, processed in this order.
    pub sources: Vec<SourceTarget>,
    /// Organization that receives forks and pushes.
    pub build_org: OrgName,
    /// Local remote name pointing at the build organization's copy.
    pub build_remote: String,
    /// Ref every source branch is pushed onto in the build organization.
    pub destination_ref: BranchName,
    /// Maximum attempts for each network operation (always ≥ 1).
    pub retry_count: u32,
    /// Cap passed to the repository listing call.
    pub repo_limit: u32,
    /// Root holding one directory per repository plus the run log.
    pub work_dir: PathBuf,
    /// File name of the per-repository skip marker.
    pub skip_marker: String,
    /// File name of the run log under `work_dir`.
    pub log_file: String,
    pub gh_program: PathBuf,
    pub git_program: PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
}

/// On-disk shape of the YAML config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceTarget>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_org: Option<OrgName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_ref: Option<BranchName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gh_program: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_program: Option<PathBuf>,
}

/// Values supplied on the command line; `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub dry_run: bool,
    pub verbose: bool,
    pub retry_count: Option<u32>,
    pub work_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// 1. Defaults
// ---------------------------------------------------------------------------

impl Config {
    /// Built-in defaults, with the working directory under `home`.
    pub fn defaults_at(home: &Path) -> Self {
        Self {
            sources: vec![
                SourceTarget::new("source-test", "TEST"),
                SourceTarget::new("source-dev", "DEV"),
            ],
            build_org: OrgName::from("source-build"),
            build_remote: DEFAULT_BUILD_REMOTE.to_string(),
            destination_ref: BranchName::from(DEFAULT_DESTINATION_REF),
            retry_count: DEFAULT_RETRY_COUNT,
            repo_limit: DEFAULT_REPO_LIMIT,
            work_dir: home.join("forksync"),
            skip_marker: DEFAULT_SKIP_MARKER.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            gh_program: PathBuf::from("gh"),
            git_program: PathBuf::from("git"),
            dry_run: false,
            verbose: false,
        }
    }

    // -----------------------------------------------------------------------
    // 2. Layering
    // -----------------------------------------------------------------------

    /// Apply the fields present in a config file on top of `self`.
    pub fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(v) = file.sources {
            self.sources = v;
        }
        if let Some(v) = file.build_org {
            self.build_org = v;
        }
        if let Some(v) = file.build_remote {
            self.build_remote = v;
        }
        if let Some(v) = file.destination_ref {
            self.destination_ref = v;
        }
        if let Some(v) = file.retry_count {
            self.retry_count = v;
        }
        if let Some(v) = file.repo_limit {
            self.repo_limit = v;
        }
        if let Some(v) = file.work_dir {
            self.work_dir = v;
        }
        if let Some(v) = file.skip_marker {
            self.skip_marker = v;
        }
        if let Some(v) = file.log_file {
            self.log_file = v;
        }
        if let Some(v) = file.gh_program {
            self.gh_program = v;
        }
        if let Some(v) = file.git_program {
            self.git_program = v;
        }
        self
    }

    /// Apply command-line overrides on top of `self`.
    pub fn apply_overrides(mut self, overrides: &Overrides) -> Self {
        self.dry_run = overrides.dry_run;
        self.verbose = overrides.verbose;
        if let Some(n) = overrides.retry_count {
            self.retry_count = n;
        }
        if let Some(dir) = overrides.work_dir.as_ref() {
            self.work_dir = dir.clone();
        }
        self
    }

    // -----------------------------------------------------------------------
    // 3. Validation
    // -----------------------------------------------------------------------

    /// Reject configurations the run controller cannot act on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one source organization is required".into(),
            ));
        }
        for source in &self.sources {
            if source.org.0.trim().is_empty() {
                return Err(ConfigError::Invalid("source organization name is empty".into()));
            }
            if source.branch.0.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "target branch for '{}' is empty",
                    source.org
                )));
            }
        }
        if self.build_org.0.trim().is_empty() {
            return Err(ConfigError::Invalid("build organization name is empty".into()));
        }
        if self.build_remote.trim().is_empty() {
            return Err(ConfigError::Invalid("build remote name is empty".into()));
        }
        if self.destination_ref.0.trim().is_empty() {
            return Err(ConfigError::Invalid("destination ref is empty".into()));
        }
        if self.retry_count == 0 {
            return Err(ConfigError::Invalid("retry count must be at least 1".into()));
        }
        if self.repo_limit == 0 {
            return Err(ConfigError::Invalid("repository limit must be at least 1".into()));
        }
        if self.skip_marker.trim().is_empty() || self.skip_marker.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "skip marker '{}' must be a plain file name",
                self.skip_marker
            )));
        }
        if self.log_file.trim().is_empty() || self.log_file.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "log file '{}' must be a plain file name",
                self.log_file
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // 4. Load
    // -----------------------------------------------------------------------

    /// Build the run configuration.
    ///
    /// `explicit` is the `--config` path; it must exist when given. Without it,
    /// `<home>/.forksync/config.yaml` is read if present.
    pub fn load_at(
        home: &Path,
        explicit: Option<&Path>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                Some(load_file(path)?)
            }
            None => {
                let path = default_config_path_at(home);
                if path.exists() {
                    Some(load_file(&path)?)
                } else {
                    None
                }
            }
        };

        let mut config = Self::defaults_at(home);
        if let Some(file) = file {
            config = config.merge_file(file);
        }
        let config = config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// `load_at` convenience wrapper.
    pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Self::load_at(&home, explicit, overrides)
    }
}

/// `<home>/.forksync/config.yaml`. Pure, no I/O.
pub fn default_config_path_at(home: &Path) -> PathBuf {
    home.join(".forksync").join("config.yaml")
}

/// Parse a YAML config file.
///
/// Returns `ConfigError::Parse` (with path + line context) if malformed.
pub fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
