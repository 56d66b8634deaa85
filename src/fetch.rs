// Cached access to failed runs, failed jobs, and job logs.
// Each read goes to its cache store first and falls back to the GitHub API on a miss.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::cache::paths::{JOBS_KEY, RUNS_KEY, logs_dir};
use crate::cache::{Freshness, Json, Store, Text};
use crate::config::Config;
use crate::error::Result;
use crate::github::{GitHubClient, Job, MAX_PER_PAGE, RateLimit, WorkflowRun};

/// Failed jobs keyed by run id.
pub type JobsByRun = BTreeMap<String, Vec<Job>>;

pub struct Fetcher<'a> {
    config: &'a Config,
    client: GitHubClient,
    per_page: u32,
    runs: Store<Json<Vec<WorkflowRun>>>,
    jobs: Store<Json<JobsByRun>>,
    logs: Store<Text>,
}

impl<'a> Fetcher<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        let client = GitHubClient::new(&config.token, &config.api_url)?;
        let ttl = config.cache_ttl;

        Ok(Self {
            config,
            client,
            per_page: MAX_PER_PAGE,
            runs: Store::new(&config.cache_dir, Freshness::Stamped(ttl)),
            jobs: Store::new(&config.cache_dir, Freshness::Stamped(ttl)),
            logs: Store::new(logs_dir(&config.cache_dir), Freshness::Modified(ttl)),
        })
    }

    #[cfg(test)]
    fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Store of downloaded job logs.
    pub fn logs(&self) -> &Store<Text> {
        &self.logs
    }

    pub fn rate_limit(&self) -> &RateLimit {
        self.client.rate_limit()
    }

    /// Failed runs, newest first, from cache when fresh.
    pub async fn failed_runs(&mut self) -> Result<Vec<WorkflowRun>> {
        if let Some(runs) = self.runs.load(RUNS_KEY) {
            return Ok(runs);
        }
        self.fetch_failed_runs().await
    }

    /// Fetch failed runs from GitHub, newest first, and cache them.
    pub async fn fetch_failed_runs(&mut self) -> Result<Vec<WorkflowRun>> {
        info!("Fetching workflow runs from GitHub API...");
        let config = self.config;
        let target = &config.target;
        let mut runs = self
            .client
            .get_failed_workflow_runs(
                &target.owner,
                &target.repo,
                &target.workflow_id,
                &target.branch,
            )
            .await?;
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.runs.store(RUNS_KEY, &runs);
        info!("Found {} failed workflow runs", runs.len());
        Ok(runs)
    }

    /// Failed jobs of `run_id`, from the job map when fresh.
    /// A miss fetches the run and rewrites the whole map.
    pub async fn failed_jobs(&mut self, run_id: u64) -> Result<Vec<Job>> {
        let mut jobs_by_run = self.jobs.load(JOBS_KEY).unwrap_or_default();
        let key = run_id.to_string();
        if let Some(jobs) = jobs_by_run.get(&key) {
            return Ok(jobs.clone());
        }

        let failed = self.fetch_failed_jobs(run_id).await?;
        jobs_by_run.insert(key, failed.clone());
        self.jobs.store(JOBS_KEY, &jobs_by_run);
        Ok(failed)
    }

    /// Every job of `run_id`, across all pages.
    /// Stops after the first page shorter than the page size.
    pub async fn fetch_all_jobs(&mut self, run_id: u64) -> Result<Vec<Job>> {
        let config = self.config;
        let target = &config.target;
        let mut all_jobs = Vec::new();
        let mut page = 1;

        loop {
            let jobs = self
                .client
                .get_jobs(&target.owner, &target.repo, run_id, page, self.per_page)
                .await?;
            let count = jobs.len();
            all_jobs.extend(jobs);

            if count < self.per_page as usize {
                break;
            }
            page += 1;
        }

        Ok(all_jobs)
    }

    /// Failed jobs of `run_id` from GitHub, in API order.
    /// Logs of the designated log job are downloaded along the way.
    pub async fn fetch_failed_jobs(&mut self, run_id: u64) -> Result<Vec<Job>> {
        let failed: Vec<Job> = self
            .fetch_all_jobs(run_id)
            .await?
            .into_iter()
            .filter(Job::is_failure)
            .collect();

        let config = self.config;
        for job in failed.iter().filter(|j| j.name == config.log_job) {
            if let Err(e) = self.fetch_job_log(job.id).await {
                warn!("Failed to fetch logs for job {}: {}", job.id, e);
            }
        }

        Ok(failed)
    }

    /// Log text of `job_id`, from the log store when fresh.
    pub async fn fetch_job_log(&mut self, job_id: u64) -> Result<String> {
        let key = job_id.to_string();
        if let Some(text) = self.logs.load(&key) {
            return Ok(text);
        }

        info!("Downloading logs for job {}", job_id);
        let config = self.config;
        let target = &config.target;
        let location = self
            .client
            .get_job_log_location(&target.owner, &target.repo, job_id)
            .await?;
        let text = self.client.download_text(&location).await?;

        self.logs.store(&key, &text);
        Ok(text)
    }
}
