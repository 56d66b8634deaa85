// Failure aggregation pass.
// Walks failed runs newest to oldest, tallies failed jobs, then rescans every cached log.

use log::{debug, info, warn};

use crate::cache::{Store, Text};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::parser::ParserRules;
use crate::state::{FailureTally, TimelineEntry};

/// Everything one pass produces.
#[derive(Debug, Default)]
pub struct Report {
    /// Failures per job name.
    pub job_counts: FailureTally,
    /// Failures per `"{package} ({test_file})"`, across every cached log.
    pub test_counts: FailureTally,
    /// Runs with at least one failed job, in visit order.
    pub timeline: Vec<TimelineEntry>,
    /// Run ids in the order they were visited.
    pub visited_runs: Vec<u64>,
}

/// Run one aggregation pass. Any error fetching runs or jobs aborts the pass.
pub async fn run_pass(fetcher: &mut Fetcher<'_>, rules: &ParserRules) -> Result<Report> {
    let mut report = Report::default();

    let runs = fetcher.failed_runs().await?;
    info!("Going through workflow runs from newest to oldest...");

    for run in &runs {
        info!("Checking workflow run from {}", run.created_at);
        report.visited_runs.push(run.id);

        let failed_jobs = fetcher.failed_jobs(run.id).await?;
        for job in &failed_jobs {
            report.job_counts.record(job.name.as_str());

            info!("Found failure in job '{}':", job.name);
            info!("  Workflow run ID: {}", run.id);
            if let Some(started_at) = job.started_at {
                info!("  Failed at: {}", started_at);
            }
            info!("  URL: {}", job.html_url);
        }

        if !failed_jobs.is_empty() {
            report.timeline.push(TimelineEntry {
                date: run.created_at,
                jobs: failed_jobs,
            });
        }
    }

    report.test_counts = tally_logs(fetcher.logs(), rules);

    let rate_limit = fetcher.rate_limit();
    debug!(
        "Rate limit after pass: {} of {} remaining",
        rate_limit.remaining, rate_limit.limit
    );

    Ok(report)
}

/// Count failure records over every log in the store, fresh or not.
/// Each log contributes each distinct record once.
pub fn tally_logs(logs: &Store<Text>, rules: &ParserRules) -> FailureTally {
    let mut tally = FailureTally::new();

    let keys = match logs.keys() {
        Ok(keys) => keys,
        Err(e) => {
            warn!("Failed to list cached logs: {}", e);
            return tally;
        }
    };

    debug!("Scanning {} cached logs in {}", keys.len(), logs.dir().display());
    for key in keys {
        match logs.peek(&key) {
            Ok(Some(text)) => {
                for record in rules.parse_failures(&text) {
                    tally.record(record.to_string());
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read cached log {}: {}", key, e),
        }
    }

    tally
}
