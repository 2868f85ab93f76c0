use clap::Parser;
use redlight_core::Config;

/// Summarize a failed GitHub Actions run and post it to Slack.
///
/// Every option overrides the matching environment variable; anything not
/// given on the command line is read from the environment (or `.env`).
#[derive(Parser, Debug)]
#[command(name = "redlight", version, about = "Summarize failed CI runs into Slack")]
pub struct CliArgs {
    /// Workflow run to analyse (default: GITHUB_RUN_ID)
    #[arg(long)]
    pub run_id: Option<u64>,

    /// AI provider: openai, anthropic, gemini or openrouter
    #[arg(long)]
    pub provider: Option<String>,

    /// Model name override (uses provider default if not set)
    #[arg(long)]
    pub model: Option<String>,

    /// Notification mode: channel or dm
    #[arg(long)]
    pub mode: Option<String>,

    /// Maximum number of excerpt lines sent to the model
    #[arg(long)]
    pub max_lines: Option<usize>,

    /// Lines of context kept on each side of a matched error line
    #[arg(long)]
    pub context_lines: Option<usize>,

    /// Extract and summarize, print the Slack message, skip delivery
    #[arg(long, env = "REDLIGHT_DRY_RUN")]
    pub dry_run: bool,
}

impl CliArgs {
    /// Fold command-line overrides into the environment config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(run_id) = self.run_id {
            config.github.run_id = Some(run_id.to_string());
        }
        if let Some(provider) = &self.provider {
            config.ai.provider = provider.to_lowercase();
        }
        if let Some(model) = &self.model {
            config.ai.model = Some(model.clone());
        }
        if let Some(mode) = &self.mode {
            config.notify.mode = mode.to_lowercase();
        }
        if let Some(max_lines) = self.max_lines {
            config.extract.max_log_lines = max_lines;
        }
        if let Some(context_lines) = self.context_lines {
            config.extract.context_lines = context_lines;
        }
    }
}

#[cfg(test)]
mod tests {
    use redlight_core::config::{AiConfig, ExtractConfig, GithubConfig, NotifyConfig};

    use super::*;

    fn config() -> Config {
        Config {
            github: GithubConfig {
                token: None,
                repository: None,
                run_id: Some("1".into()),
                api_url: "https://api.github.com".into(),
            },
            ai: AiConfig {
                provider: "openai".into(),
                openai_api_key: None,
                anthropic_api_key: None,
                gemini_api_key: None,
                openrouter_api_key: None,
                model: None,
                max_tokens: 1024,
                base_url: None,
            },
            notify: NotifyConfig {
                mode: "channel".into(),
                webhook_url: None,
                bot_token: None,
                channel_id: None,
                api_url: "https://slack.com/api".into(),
            },
            extract: ExtractConfig::default(),
        }
    }

    #[test]
    fn overrides_replace_env_values() {
        let args = CliArgs::parse_from([
            "redlight",
            "--run-id",
            "99",
            "--provider",
            "Gemini",
            "--mode",
            "DM",
            "--max-lines",
            "50",
        ]);
        let mut config = config();
        args.apply(&mut config);

        assert_eq!(config.github.run_id.as_deref(), Some("99"));
        assert_eq!(config.ai.provider, "gemini");
        assert_eq!(config.notify.mode, "dm");
        assert_eq!(config.extract.max_log_lines, 50);
        assert_eq!(config.extract.context_lines, 5);
        assert!(config.ai.model.is_none());
    }

    #[test]
    fn no_flags_keep_config() {
        let args = CliArgs::parse_from(["redlight"]);
        let mut config = config();
        args.apply(&mut config);
        assert_eq!(config.ai.provider, "openai");
        assert_eq!(config.github.run_id.as_deref(), Some("1"));
    }
}
