//! Error types for forksync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while building a [`crate::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load. Includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or pass --work-dir")]
    HomeNotFound,

    /// An explicitly requested config file did not exist.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// The merged configuration violates a constraint.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
