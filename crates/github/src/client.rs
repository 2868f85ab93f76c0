//! REST client for the Actions endpoints of one repository.

use std::future::Future;

use async_trait::async_trait;
use redlight_core::{short_sha, CommitAuthor, FailedJob, RunMetadata};
use serde_json::Value;
use tracing::debug;

use crate::source::{LogSource, SourceError};

const USER_AGENT: &str = concat!("redlight/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// Job conclusions that count as a failure.
const FAILED_CONCLUSIONS: &[&str] = &["failure", "timed_out"];

/// GitHub's maximum page size for job listings.
const JOBS_PER_PAGE: u32 = 100;

pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
    repository: String,
}

impl GitHubClient {
    /// `repository` is `owner/repo`.
    pub fn new(token: String, api_url: String, repository: String) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/actions/{}", self.api_url, self.repository, path)
    }

    async fn get(&self, path: &str, accept: &str) -> Result<reqwest::Response, SourceError> {
        let url = self.url(path);
        debug!("GitHub GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                path: path.to_string(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json(&self, path: &str) -> Result<Value, SourceError> {
        Ok(self.get(path, "application/vnd.github+json").await?.json().await?)
    }

    async fn get_json_owned(&self, path: String) -> Result<Value, SourceError> {
        self.get_json(&path).await
    }
}

/// Extract run metadata from a `GET /actions/runs/{id}` body.
pub(crate) fn parse_run(run_id: u64, body: &Value) -> Result<RunMetadata, SourceError> {
    let field = |name: &str| {
        body[name]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SourceError::Parse(format!("run is missing '{name}'")))
    };

    let author = &body["head_commit"]["author"];
    let author = CommitAuthor::new(
        author["name"].as_str().unwrap_or("unknown"),
        author["email"].as_str().map(str::to_string),
    );

    Ok(RunMetadata {
        run_id,
        workflow: field("name")?,
        branch: field("head_branch")?,
        commit: short_sha(&field("head_sha")?),
        author,
        url: field("html_url")?,
    })
}

/// One page of a `GET /actions/runs/{id}/jobs` listing.
#[derive(Debug)]
pub(crate) struct JobsPage {
    /// `total_count` across all pages.
    pub total: usize,
    /// Jobs on this page, failed or not.
    pub listed: usize,
    pub failed: Vec<FailedJob>,
}

/// Failed jobs of one listing page, listing order kept.
pub(crate) fn parse_jobs_page(body: &Value) -> Result<JobsPage, SourceError> {
    let jobs = body["jobs"]
        .as_array()
        .ok_or_else(|| SourceError::Parse("missing jobs array".into()))?;

    let failed = jobs
        .iter()
        .filter(|job| {
            job["conclusion"]
                .as_str()
                .is_some_and(|c| FAILED_CONCLUSIONS.contains(&c))
        })
        .filter_map(|job| {
            Some(FailedJob {
                id: job["id"].as_u64()?,
                name: job["name"].as_str()?.to_string(),
            })
        })
        .collect();

    Ok(JobsPage {
        total: body["total_count"].as_u64().map_or(jobs.len(), |n| n as usize),
        listed: jobs.len(),
        failed,
    })
}

/// Walk the job listing page by page (1-based) until `total_count` jobs
/// have been seen or a page comes back empty.
pub(crate) async fn collect_failed_jobs<F, Fut>(mut fetch_page: F) -> Result<Vec<FailedJob>, SourceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Value, SourceError>>,
{
    let mut failed = Vec::new();
    let mut seen = 0;
    let mut page = 1;
    loop {
        let body = fetch_page(page).await?;
        let JobsPage {
            total,
            listed,
            failed: page_failed,
        } = parse_jobs_page(&body)?;
        failed.extend(page_failed);
        seen += listed;

        if listed == 0 || seen >= total {
            break;
        }
        debug!(page, seen, total, "fetching next page of jobs");
        page += 1;
    }
    Ok(failed)
}

#[async_trait]
impl LogSource for GitHubClient {
    async fn run_metadata(&self, run_id: u64) -> Result<RunMetadata, SourceError> {
        let body = self.get_json(&format!("runs/{run_id}")).await?;
        parse_run(run_id, &body)
    }

    async fn failed_jobs(&self, run_id: u64) -> Result<Vec<FailedJob>, SourceError> {
        collect_failed_jobs(|page| {
            self.get_json_owned(format!("runs/{run_id}/jobs?per_page={JOBS_PER_PAGE}&page={page}"))
        })
        .await
    }

    async fn job_log(&self, job_id: u64) -> Result<String, SourceError> {
        // Answered with a redirect to blob storage, followed by reqwest.
        let response = self.get(&format!("jobs/{job_id}/logs"), "*/*").await?;
        Ok(response.text().await?)
    }
}
