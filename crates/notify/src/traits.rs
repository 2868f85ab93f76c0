//! Slack transport traits and shared error types.

use std::fmt;

/// The network step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStep {
    Webhook,
    LookupUser,
    OpenDirectChannel,
    PostMessage,
}

impl fmt::Display for SendStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Webhook => "webhook post",
            Self::LookupUser => "users.lookupByEmail",
            Self::OpenDirectChannel => "conversations.open",
            Self::PostMessage => "chat.postMessage",
        })
    }
}

/// Errors that can occur while routing a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Nobody to notify: the author could not be resolved and there is no
    /// fallback channel.
    #[error("no Slack user found for {author} and no fallback channel configured")]
    Resolution { author: String },

    /// The backend rejected a request or could not be reached. `detail`
    /// carries the backend's own error text.
    #[error("Slack {step} failed: {detail}")]
    Transport { step: SendStep, detail: String },

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotifyError {
    pub fn transport(step: SendStep, detail: impl fmt::Display) -> Self {
        Self::Transport {
            step,
            detail: detail.to_string(),
        }
    }

    /// Transport error from an HTTP client failure. The request URL is
    /// dropped: a webhook URL is a credential.
    pub fn http(step: SendStep, error: reqwest::Error) -> Self {
        Self::transport(step, error.without_url())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// A rendered Slack message: plain-text fallback plus Block Kit blocks.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SlackMessage {
    pub text: String,
    pub blocks: Vec<serde_json::Value>,
}

/// Slack Web API operations used by the router. Implementations hold the
/// bot token.
#[async_trait::async_trait]
pub trait SlackApi: Send + Sync {
    /// Resolve a workspace member by email. `Ok(None)` when no member has
    /// that address.
    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<String>, NotifyError>;

    /// Open (or reuse) the direct-message channel with `user_id`.
    async fn open_direct_channel(&self, user_id: &str) -> Result<String, NotifyError>;

    /// Post to a channel; returns the message timestamp.
    async fn post_message(
        &self,
        channel_id: &str,
        message: &SlackMessage,
    ) -> Result<String, NotifyError>;
}

/// An incoming-webhook destination.
#[async_trait::async_trait]
pub trait WebhookPoster: Send + Sync {
    async fn post(&self, message: &SlackMessage) -> Result<(), NotifyError>;

    /// Destination URL. Treat as a secret.
    fn url(&self) -> &str;
}
