//! Error types for forksync-sync.

use std::path::PathBuf;

use thiserror::Error;

use forksync_core::ConfigError;

/// All errors that can arise while talking to collaborators or driving the pipeline.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A collaborator ran but exited unsuccessfully.
    #[error("`{program} {args}` failed ({status}): {stderr}")]
    Command {
        program: String,
        args: String,
        status: String,
        stderr: String,
    },

    /// A collaborator could not be started at all (missing binary, permissions).
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Repository listing output was not the expected JSON.
    #[error("unexpected repository listing output: {0}")]
    Json(#[from] serde_json::Error),

    /// Working-directory or skip-marker failure surfaced from forksync-core.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The retry executor gave up.
    #[error("{what} failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        what: String,
        attempts: u32,
        #[source]
        source: Box<SyncError>,
    },

    /// The organization listing came back with no repositories.
    #[error("organization '{org}' has no repositories (or is not visible)")]
    EmptyListing { org: String },

    /// The hosting session is not authenticated.
    #[error("hosting session is not authenticated: {0}")]
    NotAuthenticated(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
