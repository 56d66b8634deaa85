// GitHub API endpoint functions.
// Provides typed methods for the GitHub Actions endpoints failmap consumes.

use reqwest::{StatusCode, header::LOCATION};

use crate::error::{FailmapError, Result};

use super::client::GitHubClient;
use super::types::{Job, JobsResponse, WorkflowRun, WorkflowRunsResponse};

/// Largest page size the Actions API accepts.
pub const MAX_PER_PAGE: u32 = 100;

impl GitHubClient {
    /// Get failed runs of one workflow on one branch, in a single request.
    pub async fn get_failed_workflow_runs(
        &mut self,
        owner: &str,
        repo: &str,
        workflow_id: &str,
        branch: &str,
    ) -> Result<Vec<WorkflowRun>> {
        let params = [
            ("branch", branch),
            ("status", "failure"),
            ("per_page", &MAX_PER_PAGE.to_string()),
        ];
        let response = self
            .get_with_params(
                &format!(
                    "/repos/{}/{}/actions/workflows/{}/runs",
                    owner, repo, workflow_id
                ),
                &params,
            )
            .await?;
        let wrapper: WorkflowRunsResponse = response.json().await?;
        Ok(wrapper.workflow_runs)
    }

    /// Get one page of jobs for a workflow run.
    pub async fn get_jobs(
        &mut self,
        owner: &str,
        repo: &str,
        run_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Job>> {
        let params = [
            ("page", &page.to_string()),
            ("per_page", &per_page.to_string()),
        ];
        let response = self
            .get_with_params(
                &format!("/repos/{}/{}/actions/runs/{}/jobs", owner, repo, run_id),
                &params,
            )
            .await?;
        let wrapper: JobsResponse = response.json().await?;
        Ok(wrapper.jobs)
    }

    /// Get the pre-signed download URL for a job's logs.
    /// The endpoint must answer `302 Found` with a `Location` header.
    pub async fn get_job_log_location(
        &mut self,
        owner: &str,
        repo: &str,
        job_id: u64,
    ) -> Result<String> {
        let response = self
            .get_unchecked(&format!(
                "/repos/{}/{}/actions/jobs/{}/logs",
                owner, repo, job_id
            ))
            .await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok());

        match (response.status(), location) {
            (StatusCode::FOUND, Some(location)) => Ok(location.to_string()),
            (status, _) => Err(FailmapError::UnexpectedResponse {
                status,
                url: response.url().to_string(),
            }),
        }
    }
}
