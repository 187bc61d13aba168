//! Run log: every event goes to the console and is appended to `<work_dir>/<log_file>`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forksync_core::{paths, Config};

/// Install the global subscriber. `--verbose` forces `debug`; otherwise
/// `RUST_LOG` is honored, falling back to `info`.
///
/// Console output goes to stdout, or to stderr when stdout carries the JSON summary.
pub fn init(config: &Config, json_summary: bool) -> Result<()> {
    let path = paths::log_path(config);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open run log '{}'", path.display()))?;

    let filter = if config.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let console = if json_summary {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let console_layer = fmt::layer().with_target(false).with_writer(console);
    let file_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install logging")?;
    Ok(())
}
