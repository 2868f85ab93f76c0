use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub const DEFAULT_MAX_LOG_LINES: usize = 200;
pub const DEFAULT_CONTEXT_LINES: usize = 5;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub github: GithubConfig,
    pub ai: AiConfig,
    pub notify: NotifyConfig,
    pub extract: ExtractConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            github: GithubConfig::from_env(),
            ai: AiConfig::from_env(),
            notify: NotifyConfig::from_env(),
            extract: ExtractConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  github:   repo={}, run_id={}",
            self.github.repository.as_deref().unwrap_or("(none)"),
            self.github.run_id.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  ai:       provider={}, model={}, credential={}",
            self.ai.provider,
            self.ai.model.as_deref().unwrap_or("(default)"),
            if self.ai.credential().is_some() { "set" } else { "missing" }
        );
        tracing::info!(
            "  notify:   mode={}, webhook={}, bot_token={}, channel={}",
            self.notify.mode,
            self.notify.webhook_url.is_some(),
            self.notify.bot_token.is_some(),
            self.notify.channel_id.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  extract:  max_log_lines={}, context_lines={}",
            self.extract.max_log_lines,
            self.extract.context_lines
        );
    }

    /// Return a redacted view (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "github": {
                "repository": self.github.repository,
                "run_id": self.github.run_id,
                "api_url": self.github.api_url,
                "configured": self.github.token.is_some(),
            },
            "ai": {
                "provider": self.ai.provider,
                "model": self.ai.model,
                "max_tokens": self.ai.max_tokens,
                "configured": self.ai.credential().is_some(),
            },
            "notify": {
                "mode": self.notify.mode,
                "webhook": self.notify.webhook_url.is_some(),
                "bot_token": self.notify.bot_token.is_some(),
                "channel_id": self.notify.channel_id,
            },
            "extract": {
                "max_log_lines": self.extract.max_log_lines,
                "context_lines": self.extract.context_lines,
            },
        })
    }
}

// ── GitHub ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    pub token: Option<String>,
    /// `owner/repo`
    pub repository: Option<String>,
    pub run_id: Option<String>,
    pub api_url: String,
}

impl GithubConfig {
    fn from_env() -> Self {
        Self {
            token: env_opt("GITHUB_TOKEN"),
            repository: env_opt("GITHUB_REPOSITORY"),
            run_id: env_opt("GITHUB_RUN_ID"),
            api_url: env_or("GITHUB_API_URL", "https://api.github.com"),
        }
    }

    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .ok_or(ConfigError::Missing("GITHUB_TOKEN"))
    }

    pub fn require_repository(&self) -> Result<&str, ConfigError> {
        let repo = self
            .repository
            .as_deref()
            .ok_or(ConfigError::Missing("GITHUB_REPOSITORY"))?;
        match repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok(repo),
            _ => Err(ConfigError::Invalid {
                key: "GITHUB_REPOSITORY",
                value: repo.to_string(),
                reason: "expected owner/repo".into(),
            }),
        }
    }

    pub fn require_run_id(&self) -> Result<u64, ConfigError> {
        let raw = self
            .run_id
            .as_deref()
            .ok_or(ConfigError::Missing("GITHUB_RUN_ID"))?;
        raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "GITHUB_RUN_ID",
            value: raw.to_string(),
            reason: "expected a numeric run id".into(),
        })
    }
}

// ── AI provider ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// "openai", "anthropic", "gemini", "openrouter"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    pub max_tokens: u32,
    /// Overrides the provider's API base URL (OpenAI-compatible gateways).
    pub base_url: Option<String>,
}

impl AiConfig {
    fn from_env() -> Self {
        Self {
            provider: env_or("AI_PROVIDER", "openai").to_lowercase(),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            openrouter_api_key: env_opt("OPENROUTER_API_KEY"),
            model: env_opt("AI_MODEL"),
            max_tokens: env_u32("AI_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            base_url: env_opt("AI_BASE_URL"),
        }
    }

    /// Credential for the currently selected provider, if any.
    pub fn credential(&self) -> Option<&str> {
        self.credential_for(&self.provider)
    }

    pub fn credential_for(&self, provider: &str) -> Option<&str> {
        match provider {
            "openai" => self.openai_api_key.as_deref(),
            "anthropic" => self.anthropic_api_key.as_deref(),
            "gemini" => self.gemini_api_key.as_deref(),
            "openrouter" => self.openrouter_api_key.as_deref(),
            _ => None,
        }
    }
}

// ── Slack ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// "channel" or "dm"
    pub mode: String,
    pub webhook_url: Option<String>,
    pub bot_token: Option<String>,
    /// Target channel in channel mode, fallback channel in DM mode.
    pub channel_id: Option<String>,
    pub api_url: String,
}

impl NotifyConfig {
    fn from_env() -> Self {
        Self {
            mode: env_or("NOTIFY_MODE", "channel").to_lowercase(),
            webhook_url: env_opt("SLACK_WEBHOOK_URL"),
            bot_token: env_opt("SLACK_BOT_TOKEN"),
            channel_id: env_opt("SLACK_CHANNEL_ID"),
            api_url: env_or("SLACK_API_URL", "https://slack.com/api"),
        }
    }
}

// ── Extraction ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub max_log_lines: usize,
    pub context_lines: usize,
    pub prompt_template: Option<PathBuf>,
}

impl ExtractConfig {
    fn from_env() -> Self {
        Self {
            max_log_lines: env_usize("MAX_LOG_LINES", DEFAULT_MAX_LOG_LINES),
            context_lines: env_usize("CONTEXT_LINES", DEFAULT_CONTEXT_LINES),
            prompt_template: env_opt("PROMPT_TEMPLATE").map(PathBuf::from),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_log_lines: DEFAULT_MAX_LOG_LINES,
            context_lines: DEFAULT_CONTEXT_LINES,
            prompt_template: None,
        }
    }
}
