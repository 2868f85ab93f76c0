//! One pass from a failed run to a delivered Slack message.
//!
//! Steps run strictly in order: fetch metadata and failed jobs, build the
//! log corpus one job at a time, extract (falling back to the tail),
//! prompt the model once, render the message, route it. Any step failing
//! ends the run.

use anyhow::{Context, Result};
use redlight_core::{FailedJob, RunMetadata};
use redlight_extract::{
    extract, tail, CorpusBuilder, Excerpt, ExcerptStrategy, ExtractOptions, JobEntry, LogCorpus,
    SignatureSet, SKIPPED_MARKER,
};
use redlight_github::{LogSource, SourceError};
use redlight_llm::{LlmProvider, PromptContext, PromptTemplate};
use redlight_notify::{
    MessageContext, MessageRenderer, NotificationOutcome, NotificationRouter, SlackMessage,
};
use tracing::{info, warn};

pub struct Pipeline<'a> {
    pub source: &'a dyn LogSource,
    pub llm: &'a dyn LlmProvider,
    /// `None` in dry-run mode.
    pub router: Option<&'a NotificationRouter>,
    pub template: PromptTemplate,
    pub signatures: SignatureSet,
    pub options: ExtractOptions,
    pub max_tokens: u32,
}

/// What a run produced, for logging and action outputs.
#[derive(Debug)]
pub struct RunReport {
    pub run: RunMetadata,
    pub strategy: ExcerptStrategy,
    pub summary: String,
    pub message: SlackMessage,
    pub notification: Option<NotificationOutcome>,
}

impl Pipeline<'_> {
    pub async fn run(&self, run_id: u64) -> Result<RunReport> {
        let run = self
            .source
            .run_metadata(run_id)
            .await
            .context("failed to fetch run metadata")?;
        let failed = self
            .source
            .failed_jobs(run_id)
            .await
            .context("failed to list jobs")?;
        info!(
            run_id,
            workflow = %run.workflow,
            failed_jobs = failed.len(),
            "analysing failed run"
        );

        let (corpus, jobs) = collect_corpus(self.source, run_id, &failed).await?;
        let excerpt = self.excerpt(&corpus);
        info!(
            strategy = excerpt.strategy().as_str(),
            lines = excerpt.len(),
            corpus_lines = corpus.len(),
            "excerpt ready"
        );

        let job_names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
        let prompt = self
            .template
            .render(&PromptContext {
                run: &run,
                failed_jobs: job_names.clone(),
                strategy: excerpt.strategy().as_str(),
                excerpt: excerpt.text(),
                line_count: excerpt.len(),
                truncated: excerpt.is_truncated(),
                skipped_marker: SKIPPED_MARKER,
            })
            .context("failed to render prompt")?;

        let summary = self
            .llm
            .complete(&prompt, self.max_tokens)
            .await
            .with_context(|| format!("{} completion failed", self.llm.kind()))?;
        info!(provider = %self.llm.kind(), model = %self.llm.model(), "summary received");

        let ctx = MessageContext::new(
            run.clone(),
            summary.clone(),
            job_names.iter().map(|n| n.to_string()).collect(),
        );
        let message = MessageRenderer::new()
            .render(&ctx)
            .context("failed to render Slack message")?;

        let notification = match self.router {
            Some(router) => Some(
                router
                    .notify(&message, Some(&run.author))
                    .await
                    .context("notification failed")?,
            ),
            None => None,
        };

        Ok(RunReport {
            run,
            strategy: excerpt.strategy(),
            summary,
            message,
            notification,
        })
    }

    fn excerpt(&self, corpus: &LogCorpus) -> Excerpt {
        extract(corpus, &self.options, &self.signatures)
            .unwrap_or_else(|| tail(corpus, self.options.max_lines))
    }
}

/// Fetch job logs one at a time, in listing order. A failed fetch skips
/// that job; the run only aborts when no log could be read at all.
pub async fn collect_corpus(
    source: &dyn LogSource,
    run_id: u64,
    failed: &[FailedJob],
) -> Result<(LogCorpus, Vec<JobEntry>), SourceError> {
    let mut builder = CorpusBuilder::new();
    for job in failed {
        match source.job_log(job.id).await {
            Ok(raw) => {
                builder.push_job(&job.name, job.id, &raw);
            }
            Err(e) => {
                warn!(job = %job.name, job_id = job.id, error = %e, "skipping job without log");
                builder.skip_job(&job.name, job.id);
            }
        }
    }

    if builder.included_jobs() == 0 {
        return Err(SourceError::NoLogs { run_id });
    }

    let jobs = builder.jobs().to_vec();
    Ok((builder.build(), jobs))
}
