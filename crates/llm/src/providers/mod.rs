pub mod anthropic;
pub mod gemini;
pub mod openai;

use redlight_core::config::AiConfig;

use crate::provider::{LlmError, LlmProvider, ProviderKind};

/// Everything needed to construct one backend.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub credential: String,
    pub model: String,
    pub base_url: String,
}

impl ProviderSettings {
    /// Resolve settings for `kind`; `model` and `base_url` fall back to the
    /// provider defaults. A missing or blank credential is a configuration
    /// error.
    pub fn resolve(
        kind: ProviderKind,
        credential: Option<&str>,
        model: Option<&str>,
        base_url: Option<&str>,
    ) -> Result<Self, LlmError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::MissingCredential {
                provider: kind,
                env: kind.credential_env(),
            })?;

        Ok(Self {
            kind,
            credential: credential.to_string(),
            model: model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(kind.default_model())
                .to_string(),
            base_url: base_url.unwrap_or(kind.default_base_url()).to_string(),
        })
    }

    /// Resolve settings from the environment-backed config. The provider
    /// string is validated before anything else.
    pub fn from_config(config: &AiConfig) -> Result<Self, LlmError> {
        let kind: ProviderKind = config.provider.parse()?;
        Self::resolve(
            kind,
            config.credential_for(kind.as_str()),
            config.model.as_deref(),
            config.base_url.as_deref(),
        )
    }
}

/// Create the backend for the given settings.
pub fn create_provider(settings: ProviderSettings) -> Box<dyn LlmProvider> {
    let ProviderSettings {
        kind,
        credential,
        model,
        base_url,
    } = settings;

    match kind {
        ProviderKind::OpenAi => Box::new(openai::OpenAiProvider::new(credential, model, base_url)),
        ProviderKind::OpenRouter => Box::new(openai::OpenAiProvider::openrouter(
            credential, model, base_url,
        )),
        ProviderKind::Anthropic => Box::new(anthropic::AnthropicProvider::new(
            credential, model, base_url,
        )),
        ProviderKind::Gemini => Box::new(gemini::GeminiProvider::new(credential, model, base_url)),
    }
}

/// Single dispatch point: one completion against the selected backend.
/// Failures propagate immediately; nothing is retried.
pub async fn complete(
    provider: ProviderKind,
    credential: &str,
    model: &str,
    prompt: &str,
    max_tokens: u32,
) -> Result<String, LlmError> {
    let settings = ProviderSettings::resolve(provider, Some(credential), Some(model), None)?;
    create_provider(settings).complete(prompt, max_tokens).await
}
