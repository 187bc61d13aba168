//! Subprocess plumbing shared by the `gh` and `git` clients.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::error::SyncError;

/// Run `program args…` to completion and capture its output.
///
/// Only a failure to spawn is an error here; the exit status is left to the
/// caller. Interactive prompts are disabled so a missing credential fails the
/// command instead of blocking the run.
pub(crate) fn output(program: &Path, args: &[&OsStr]) -> Result<Output, SyncError> {
    tracing::debug!(program = %program.display(), args = %join_args(args), "exec");
    Command::new(program)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GH_PROMPT_DISABLED", "1")
        .stdin(Stdio::null())
        .output()
        .map_err(|source| SyncError::Spawn {
            program: program.display().to_string(),
            source,
        })
}

/// Like [`output`], but a non-zero exit becomes [`SyncError::Command`].
/// Returns stdout on success.
pub(crate) fn checked(program: &Path, args: &[&OsStr]) -> Result<String, SyncError> {
    let out = output(program, args)?;
    if !out.status.success() {
        return Err(command_failed(program, args, &out));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

pub(crate) fn command_failed(program: &Path, args: &[&OsStr], out: &Output) -> SyncError {
    SyncError::Command {
        program: program.display().to_string(),
        args: join_args(args),
        status: out.status.to_string(),
        stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
    }
}

fn join_args(args: &[&OsStr]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
