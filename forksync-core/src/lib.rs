//! forksync core library: domain types, configuration, working-directory layout.
//!
//! - [`types`]: newtypes for organizations, repositories, branches
//! - [`config`]: [`Config`] defaults, YAML loading, validation
//! - [`paths`]: where repositories, skip markers, and the run log live
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use config::{Config, ConfigFile};
pub use error::ConfigError;
pub use types::{BranchName, OrgName, RepoName, SourceTarget};
