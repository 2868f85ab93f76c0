use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;

/// The closed set of completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::OpenRouter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Model used when the caller does not override it.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Gemini => "gemini-1.5-flash",
            Self::OpenRouter => "openai/gpt-4o-mini",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn credential_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| LlmError::UnknownProvider(s.to_string()))
    }
}

/// A completion backend. One implementation per provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the completion text.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;

    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("unknown AI provider: '{0}' (expected one of: openai, anthropic, gemini, openrouter)")]
    UnknownProvider(String),
    #[error("no API key for provider {provider}: set {env}")]
    MissingCredential {
        provider: ProviderKind,
        env: &'static str,
    },
    /// The request URL is stripped: some backends carry credentials in it.
    #[error("HTTP request failed: {0}")]
    HttpError(#[source] reqwest::Error),
    #[error("API error: {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("prompt template error: {0}")]
    Template(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        Self::HttpError(e.without_url())
    }
}

impl LlmError {
    /// Configuration problems are detected before any request is sent.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownProvider(_) | Self::MissingCredential { .. } | Self::Template(_)
        )
    }
}
