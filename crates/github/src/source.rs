use async_trait::async_trait;
use redlight_core::{FailedJob, RunMetadata};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request URL is stripped: log downloads redirect to signed URLs.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("GitHub API error {status} for {path}: {body}")]
    Api {
        status: u16,
        path: String,
        body: String,
    },

    #[error("Unexpected GitHub response: {0}")]
    Parse(String),

    /// None of the failed jobs of the run produced a readable log.
    #[error("no job logs could be retrieved for run {run_id}")]
    NoLogs { run_id: u64 },
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}

/// Where the failing run's metadata and logs come from.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn run_metadata(&self, run_id: u64) -> Result<RunMetadata, SourceError>;

    /// Jobs that failed or timed out, in the listing order of the run.
    async fn failed_jobs(&self, run_id: u64) -> Result<Vec<FailedJob>, SourceError>;

    /// Raw log text of one job.
    async fn job_log(&self, job_id: u64) -> Result<String, SourceError>;
}
