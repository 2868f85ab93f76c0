use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, ProviderKind};

/// OpenAI chat completions. Also serves OpenRouter, which speaks the same
/// protocol under a different base URL.
pub struct OpenAiProvider {
    client: reqwest::Client,
    kind: ProviderKind,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            kind: ProviderKind::OpenAi,
            api_key,
            model,
            base_url,
        }
    }

    pub fn openrouter(api_key: String, model: String, base_url: String) -> Self {
        Self {
            kind: ProviderKind::OpenRouter,
            ..Self::new(api_key, model, base_url)
        }
    }

    pub(crate) fn build_request_body(model: &str, prompt: &str, max_tokens: u32) -> serde_json::Value {
        json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": max_tokens,
        })
    }

    pub(crate) fn parse_response(resp: &serde_json::Value) -> Result<String, LlmError> {
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))?;
        non_empty(content)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = Self::build_request_body(&self.model, prompt, max_tokens);

        debug!(provider = %self.kind, model = %self.model, "completion request to {}", url);

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body);
        if self.kind == ProviderKind::OpenRouter {
            request = request.header("X-Title", "redlight");
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let resp: serde_json::Value = response.json().await?;
        Self::parse_response(&resp)
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Reject blank completions; a summary with no text is a malformed reply.
pub(crate) fn non_empty(text: &str) -> Result<String, LlmError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LlmError::ParseError("empty completion".into()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_has_single_user_message() {
        let body = OpenAiProvider::build_request_body("gpt-4o-mini", "why did it fail?", 512);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 512);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "why did it fail?");
    }

    #[test]
    fn parses_first_choice() {
        let resp = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Missing import.\n" } }]
        });
        assert_eq!(OpenAiProvider::parse_response(&resp).unwrap(), "Missing import.");
    }

    #[test]
    fn malformed_and_empty_responses_are_errors() {
        let err = OpenAiProvider::parse_response(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));

        let resp = json!({ "choices": [{ "message": { "content": "   " } }] });
        assert!(OpenAiProvider::parse_response(&resp).is_err());
    }

    #[test]
    fn openrouter_shares_protocol() {
        let p = OpenAiProvider::openrouter(
            "key".into(),
            "openai/gpt-4o-mini".into(),
            ProviderKind::OpenRouter.default_base_url().into(),
        );
        assert_eq!(p.kind(), ProviderKind::OpenRouter);
        assert_eq!(p.model(), "openai/gpt-4o-mini");
    }
}
