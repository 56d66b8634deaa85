// failmap: tally GitHub Actions failures for one workflow branch.
// Parses configuration, runs one aggregation pass, and reports the results.

mod aggregate;
mod cache;
mod cli;
mod config;
mod error;
mod fetch;
mod github;
mod parser;
mod state;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use crate::aggregate::Report;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::Fetcher;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// One pass for `cli`. Only configuration errors are returned.
/// A failed pass is logged here and counts as a clean exit.
async fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    let mut fetcher = Fetcher::new(&config)?;

    info!("Analyzing failures on branch '{}'", config.target.branch);
    match aggregate::run_pass(&mut fetcher, &config.parser).await {
        Ok(report) => print_summary(&config, &report),
        Err(e) if e.is_http() => error!("HTTP Error: {}", e),
        Err(e) => error!("Error: {}", e),
    }

    Ok(())
}

fn print_summary(config: &Config, report: &Report) {
    if report.job_counts.is_empty() {
        info!(
            "No failed jobs found in the workflow on branch '{}'.",
            config.target.branch
        );
        return;
    }

    info!("Failure Summary by Job:");
    for (job_name, count) in report.job_counts.by_name() {
        info!("  {}: {} failures", job_name, count);
    }
    info!(
        "Total failures across all jobs: {}",
        report.job_counts.total()
    );

    if report.test_counts.is_empty() {
        info!("No failing tests found in cached logs.");
    } else {
        info!("Failure Summary by Test:");
        for (record, count) in report.test_counts.by_count() {
            info!("  {}: {} failures", record, count);
        }
    }

    match ui::write_heatmap(&report.timeline, &config.output) {
        Ok(()) => info!("Failure timeline written to {}", config.output.display()),
        Err(e) => warn!("Failed to write failure timeline: {}", e),
    }
}
