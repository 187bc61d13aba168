//! forksync: mirror organization repositories into a build organization.
//!
//! # Usage
//!
//! ```text
//! forksync [--dry-run] [--verbose] [--retry-count N] [--config PATH] [--work-dir PATH] [--json]
//! ```
//!
//! Exit codes: `0` every organization succeeded, `1` a precondition failed or
//! any organization reported a failure, `130` interrupted.

mod logging;
mod summary;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;

use forksync_core::{config::Overrides, paths, Config};
use forksync_sync::{run, GhCli, GitCli, ThreadSleeper};

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "forksync",
    version,
    about = "Fork every repository of the source organizations into the build organization and push their branches",
    long_about = None,
)]
struct Cli {
    /// Log what would happen without cloning, forking, or pushing anything.
    #[arg(long)]
    dry_run: bool,

    /// Enable debug-level logging.
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Attempts per network operation (clone, fork, push).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    retry_count: Option<u32>,

    /// YAML configuration file (default: ~/.forksync/config.yaml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Root directory for repository clones and the run log.
    #[arg(long, value_name = "PATH")]
    work_dir: Option<PathBuf>,

    /// Print the run summary as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_FAILURE),
            };
        }
    };

    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    let overrides = Overrides {
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        retry_count: cli.retry_count,
        work_dir: cli.work_dir,
    };
    let config = Config::load(cli.config.as_deref(), &overrides)
        .context("failed to load configuration")?;

    paths::ensure_work_dir(&config.work_dir).with_context(|| {
        format!(
            "cannot create working directory '{}'",
            config.work_dir.display()
        )
    })?;
    logging::init(&config, cli.json)?;

    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let interrupt = Arc::clone(&interrupt);
        ctrlc::set_handler(move || {
            interrupt.store(true, Ordering::SeqCst);
        })
        .context("failed to install interrupt handler")?;
    }

    tracing::info!(
        work_dir = %config.work_dir.display(),
        sources = config.sources.len(),
        build_org = %config.build_org,
        retry_count = config.retry_count,
        dry_run = config.dry_run,
        "forksync starting"
    );

    let hosting = GhCli::new(&config.gh_program);
    let vcs = GitCli::new(&config.git_program);
    let report = run::run(&config, &hosting, &vcs, &ThreadSleeper, &interrupt)
        .context("authentication check failed; run `gh auth login` first")?;

    if cli.json {
        summary::print_json(&report)?;
    } else {
        summary::print_table(&report);
    }

    if report.interrupted {
        tracing::warn!("run interrupted");
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_FAILURE))
    }
}
