//! End-of-run summary: one table row per source organization plus a banner.

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use forksync_sync::{OrgReport, RunReport};

#[derive(Tabled)]
struct OrgRow {
    #[tabled(rename = "organization")]
    org: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "processed")]
    processed: usize,
    #[tabled(rename = "failed")]
    failed: usize,
    #[tabled(rename = "skipped")]
    skipped: usize,
    #[tabled(rename = "status")]
    status: String,
}

pub fn print_json(report: &RunReport) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("failed to serialize run summary")?
    );
    Ok(())
}

pub fn print_table(report: &RunReport) {
    for org in &report.orgs {
        tracing::info!(
            org = %org.org,
            branch = %org.branch,
            processed = org.processed,
            failed = org.failed,
            skipped = org.skipped,
            "summary"
        );
    }

    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    if report.orgs.is_empty() {
        println!("{prefix}No organizations processed.");
    } else {
        let rows: Vec<OrgRow> = report.orgs.iter().map(row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for org in &report.orgs {
        for failure in &org.failures {
            println!("  {} {}: {}", "✗".red(), failure.repo, failure.error);
        }
    }

    let banner = if report.interrupted {
        format!("{prefix}interrupted").yellow().bold()
    } else if report.is_success() {
        format!("{prefix}✓ all organizations synced").green().bold()
    } else {
        format!(
            "{prefix}✗ sync finished with failures ({} repositories failed)",
            report.total_failed()
        )
        .red()
        .bold()
    };
    println!("{banner}");
}

fn row(org: &OrgReport) -> OrgRow {
    let status = if let Some(err) = org.listing_error.as_ref() {
        format!("LISTING FAILED: {err}")
    } else if org.interrupted {
        "INTERRUPTED".to_string()
    } else if org.failed > 0 {
        "FAILED".to_string()
    } else {
        "OK".to_string()
    };
    OrgRow {
        org: org.org.to_string(),
        branch: org.branch.to_string(),
        processed: org.processed,
        failed: org.failed,
        skipped: org.skipped,
        status,
    }
}
