//! Slack Web API client authenticated with a bot token.
//!
//! Slack answers most failures with HTTP 200 and `{"ok": false, "error":
//! "..."}`, so every response body is checked for `ok`.

use serde_json::{json, Value};

use crate::traits::{NotifyError, SendStep, SlackApi, SlackMessage};

/// Slack's answer when no member has the requested email.
const USER_NOT_FOUND: &str = "users_not_found";

#[derive(Debug)]
pub struct SlackWebClient {
    bot_token: String,
    api_url: String,
    client: reqwest::Client,
}

impl SlackWebClient {
    pub fn new(bot_token: String, api_url: String) -> Result<Self, NotifyError> {
        if bot_token.trim().is_empty() {
            return Err(NotifyError::Config(
                "Slack bot token must not be empty".to_string(),
            ));
        }

        Ok(Self {
            bot_token: bot_token.trim().to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_url, method)
    }

    async fn read(
        step: SendStep,
        response: reqwest::Response,
    ) -> Result<Value, NotifyError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NotifyError::http(step, e))?;

        if !status.is_success() {
            return Err(NotifyError::transport(step, format!("{status}: {text}")));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| NotifyError::transport(step, format!("invalid JSON response: {e}")))?;
        check_ok(step, body)
    }
}

/// Return the body if `ok` is true, otherwise a transport error carrying
/// Slack's `error` code.
pub(crate) fn check_ok(step: SendStep, body: Value) -> Result<Value, NotifyError> {
    if body.get("ok") == Some(&Value::Bool(true)) {
        return Ok(body);
    }

    let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown Slack API error");
    Err(NotifyError::transport(step, error))
}

pub(crate) fn message_body(channel_id: &str, message: &SlackMessage) -> Value {
    json!({
        "channel": channel_id,
        "text": message.text,
        "blocks": message.blocks,
        "unfurl_links": false,
    })
}

#[async_trait::async_trait]
impl SlackApi for SlackWebClient {
    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<String>, NotifyError> {
        let step = SendStep::LookupUser;
        let response = self
            .client
            .get(self.endpoint("users.lookupByEmail"))
            .bearer_auth(&self.bot_token)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| NotifyError::http(step, e))?;

        match Self::read(step, response).await {
            Ok(body) => {
                let id = body["user"]["id"]
                    .as_str()
                    .ok_or_else(|| NotifyError::transport(step, "missing user.id"))?;
                Ok(Some(id.to_string()))
            }
            Err(NotifyError::Transport { detail, .. }) if detail == USER_NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn open_direct_channel(&self, user_id: &str) -> Result<String, NotifyError> {
        let step = SendStep::OpenDirectChannel;
        let response = self
            .client
            .post(self.endpoint("conversations.open"))
            .bearer_auth(&self.bot_token)
            .json(&json!({ "users": user_id }))
            .send()
            .await
            .map_err(|e| NotifyError::http(step, e))?;

        let body = Self::read(step, response).await?;
        body["channel"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| NotifyError::transport(step, "missing channel.id"))
    }

    async fn post_message(
        &self,
        channel_id: &str,
        message: &SlackMessage,
    ) -> Result<String, NotifyError> {
        let step = SendStep::PostMessage;
        tracing::debug!(channel = %channel_id, "posting Slack message");

        let response = self
            .client
            .post(self.endpoint("chat.postMessage"))
            .bearer_auth(&self.bot_token)
            .json(&message_body(channel_id, message))
            .send()
            .await
            .map_err(|e| NotifyError::http(step, e))?;

        let body = Self::read(step, response).await?;
        Ok(body["ts"].as_str().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_body_passes_through() {
        let body = json!({ "ok": true, "channel": { "id": "D123" } });
        let checked = check_ok(SendStep::OpenDirectChannel, body).unwrap();
        assert_eq!(checked["channel"]["id"], "D123");
    }

    #[test]
    fn not_ok_keeps_slack_error_code() {
        let err = check_ok(
            SendStep::PostMessage,
            json!({ "ok": false, "error": "channel_not_found" }),
        )
        .unwrap_err();
        match err {
            NotifyError::Transport { step, detail } => {
                assert_eq!(step, SendStep::PostMessage);
                assert_eq!(detail, "channel_not_found");
            }
            other => panic!("expected Transport error, got: {other:?}"),
        }
    }

    #[test]
    fn missing_ok_is_an_error() {
        let err = check_ok(SendStep::LookupUser, json!({})).unwrap_err();
        assert!(err.to_string().contains("unknown Slack API error"));
    }

    #[test]
    fn empty_token_rejected() {
        let err = SlackWebClient::new("  ".into(), "https://slack.com/api".into()).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn endpoint_joins_method() {
        let client =
            SlackWebClient::new("xoxb-1".into(), "https://slack.com/api/".into()).unwrap();
        assert_eq!(
            client.endpoint("chat.postMessage"),
            "https://slack.com/api/chat.postMessage"
        );
    }

    #[test]
    fn message_body_shape() {
        let message = SlackMessage {
            text: "fallback".into(),
            blocks: vec![json!({ "type": "divider" })],
        };
        let body = message_body("C42", &message);
        assert_eq!(body["channel"], "C42");
        assert_eq!(body["text"], "fallback");
        assert_eq!(body["blocks"].as_array().unwrap().len(), 1);
    }
}
