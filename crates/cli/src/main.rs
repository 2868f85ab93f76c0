mod cli;
mod outputs;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use redlight_core::config::{self, Config};
use redlight_extract::{ExtractOptions, SignatureSet};
use redlight_github::GitHubClient;
use redlight_llm::{create_provider, PromptTemplate, ProviderSettings};
use redlight_notify::{NotificationOutcome, NotificationRouter};

use crate::cli::CliArgs;
use crate::pipeline::{Pipeline, RunReport};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run(CliArgs::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    config::load_dotenv();
    let mut config = Config::from_env();
    args.apply(&mut config);
    config.log_summary();
    tracing::debug!(config = %config.redacted_summary(), "effective configuration");

    // Everything that can be checked offline is checked before the first request.
    let settings = ProviderSettings::from_config(&config.ai).context("invalid AI configuration")?;
    let llm = create_provider(settings);

    let router = if args.dry_run {
        info!("dry run: Slack delivery disabled");
        None
    } else {
        let router =
            NotificationRouter::from_config(&config.notify).context("invalid Slack configuration")?;
        router.validate().context("invalid Slack configuration")?;
        Some(router)
    };

    let template = match &config.extract.prompt_template {
        Some(path) => PromptTemplate::from_file(path)
            .with_context(|| format!("failed to load prompt template {}", path.display()))?,
        None => PromptTemplate::builtin(),
    };

    let run_id = config.github.require_run_id()?;
    let source = GitHubClient::new(
        config.github.require_token()?.to_string(),
        config.github.api_url.clone(),
        config.github.require_repository()?.to_string(),
    )?;

    let pipeline = Pipeline {
        source: &source,
        llm: &*llm,
        router: router.as_ref(),
        template,
        signatures: SignatureSet::default(),
        options: ExtractOptions {
            max_lines: config.extract.max_log_lines,
            context_radius: config.extract.context_lines,
        },
        max_tokens: config.ai.max_tokens,
    };

    let report = pipeline.run(run_id).await?;
    report_outcome(&report);

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&report.message)?);
    }

    if let Some(path) = std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from) {
        let target = report
            .notification
            .as_ref()
            .map(|n| n.delivery().target.report_id())
            .unwrap_or("none");
        outputs::write_outputs(
            &path,
            &[
                ("summary", report.summary.as_str()),
                ("notification-target", target),
                ("excerpt-strategy", report.strategy.as_str()),
            ],
        )
        .with_context(|| format!("failed to write outputs to {}", path.display()))?;
    }

    Ok(())
}

fn report_outcome(report: &RunReport) {
    match &report.notification {
        Some(NotificationOutcome::Delivered(delivery)) => info!(
            run_id = report.run.run_id,
            target = %delivery.target.report_id(),
            "notification delivered"
        ),
        Some(NotificationOutcome::DeliveredViaFallback { delivery, reason }) => info!(
            run_id = report.run.run_id,
            target = %delivery.target.report_id(),
            ?reason,
            "notification delivered to fallback channel"
        ),
        None => info!(run_id = report.run.run_id, "summary generated, nothing sent"),
    }
}
