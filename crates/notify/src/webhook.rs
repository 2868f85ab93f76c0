//! Slack incoming-webhook delivery.
//!
//! Posts `{text, blocks}` as JSON. Any non-2xx response is a transport
//! failure; a webhook has no secondary destination.

use crate::traits::{NotifyError, SendStep, SlackMessage, WebhookPoster};

#[derive(Debug)]
pub struct SlackWebhook {
    /// Target URL.
    url: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl SlackWebhook {
    /// Create a webhook poster. The URL must be absolute http(s).
    pub fn new(url: String) -> Result<Self, NotifyError> {
        let trimmed = url.trim();
        if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
            return Err(NotifyError::Config(
                "Slack webhook URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(Self {
            url: trimmed.to_string(),
            client: reqwest::Client::new(),
        })
    }

    pub(crate) fn payload(message: &SlackMessage) -> serde_json::Value {
        serde_json::json!({
            "text": message.text,
            "blocks": message.blocks,
        })
    }
}

#[async_trait::async_trait]
impl WebhookPoster for SlackWebhook {
    async fn post(&self, message: &SlackMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::payload(message))
            .send()
            .await
            .map_err(|e| NotifyError::http(SendStep::Webhook, e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(%status, body = %body_text, "webhook returned non-2xx status");
            return Err(NotifyError::transport(
                SendStep::Webhook,
                format!("{status}: {body_text}"),
            ));
        }

        tracing::debug!(%status, "webhook notification delivered");
        Ok(())
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_url() {
        let err = SlackWebhook::new("hooks.slack.com/services/x".into()).unwrap_err();
        assert!(matches!(err, NotifyError::Config(ref m) if m.contains("http")));
    }

    #[test]
    fn trims_url() {
        let hook = SlackWebhook::new(" https://hooks.slack.com/services/T/B/X \n".into()).unwrap();
        assert_eq!(hook.url(), "https://hooks.slack.com/services/T/B/X");
    }

    #[tokio::test]
    async fn unreachable_webhook_error_hides_url() {
        let hook =
            SlackWebhook::new("http://127.0.0.1:1/services/T0/B0/SECRETTOKEN".into()).unwrap();
        let message = SlackMessage {
            text: "CI failed".into(),
            blocks: Vec::new(),
        };

        let err = hook.post(&message).await.unwrap_err();
        assert!(matches!(
            err,
            NotifyError::Transport { step: SendStep::Webhook, .. }
        ));
        let text = err.to_string();
        assert!(!text.contains("SECRETTOKEN"), "webhook URL leaked: {text}");
        assert!(!text.contains("/services/"), "webhook URL leaked: {text}");
    }

    #[test]
    fn payload_carries_text_and_blocks() {
        let message = SlackMessage {
            text: "CI failed".into(),
            blocks: vec![serde_json::json!({ "type": "divider" })],
        };
        let payload = SlackWebhook::payload(&message);
        assert_eq!(payload["text"], "CI failed");
        assert_eq!(payload["blocks"][0]["type"], "divider");
    }
}
