use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::openai::non_empty;
use crate::provider::{LlmError, LlmProvider, ProviderKind};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    /// Build the request body for the Gemini generateContent API.
    pub(crate) fn build_request_body(prompt: &str, max_tokens: u32) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "maxOutputTokens": max_tokens,
            },
        })
    }

    /// The key goes in a header so it never appears in a URL.
    fn request(&self, prompt: &str, max_tokens: u32) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model,
        );
        self.client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request_body(prompt, max_tokens))
    }

    pub(crate) fn parse_response(resp: &serde_json::Value) -> Result<String, LlmError> {
        let parts = resp["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| {
                LlmError::ParseError("missing candidates[0].content.parts".into())
            })?;

        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");

        non_empty(&text)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        debug!("Gemini request to model={}", self.model);

        let response = self.request(prompt, max_tokens).send().await?;

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
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }
}
