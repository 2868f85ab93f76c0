//! Decides where a failure notification goes and delivers it.
//!
//! Channel mode posts to the webhook when one is configured, otherwise to
//! the configured channel through the bot token. DM mode resolves the
//! commit author by email, opens a direct message and posts there; when
//! the author cannot be resolved the message goes to the fallback channel
//! instead. Nothing is retried.
//!
//! Terminal states are [`NotificationOutcome::Delivered`],
//! [`NotificationOutcome::DeliveredViaFallback`] and `Err(NotifyError)`.

use std::fmt;
use std::str::FromStr;

use redlight_core::config::NotifyConfig;
use redlight_core::CommitAuthor;

use crate::slack::SlackWebClient;
use crate::traits::{NotifyError, SlackApi, SlackMessage, WebhookPoster};
use crate::webhook::SlackWebhook;

/// How the notification should be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMode {
    Channel,
    DirectMessage,
}

impl FromStr for NotifyMode {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "channel" => Ok(Self::Channel),
            "dm" => Ok(Self::DirectMessage),
            other => Err(NotifyError::Config(format!(
                "unknown notification mode: '{other}' (expected 'channel' or 'dm')"
            ))),
        }
    }
}

impl fmt::Display for NotifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Channel => "channel",
            Self::DirectMessage => "dm",
        })
    }
}

/// Where a message was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    DirectMessage(String),
    Channel(String),
    Webhook(String),
}

impl NotificationTarget {
    /// Identifier safe to report. Webhook URLs are secrets and are never
    /// returned.
    pub fn report_id(&self) -> &str {
        match self {
            Self::DirectMessage(user_id) => user_id,
            Self::Channel(channel_id) => channel_id,
            Self::Webhook(_) => "webhook",
        }
    }
}

/// Why DM resolution fell back to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NoEmail,
    UserNotFound,
    LookupFailed(String),
}

/// A successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub target: NotificationTarget,
    /// Slack message timestamp; webhooks do not return one.
    pub timestamp: Option<String>,
}

/// Successful terminal states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered(Delivery),
    DeliveredViaFallback {
        delivery: Delivery,
        reason: FallbackReason,
    },
}

impl NotificationOutcome {
    pub fn delivery(&self) -> &Delivery {
        match self {
            Self::Delivered(d) => d,
            Self::DeliveredViaFallback { delivery, .. } => delivery,
        }
    }

    /// The Slack user the message was sent to, for DM deliveries.
    pub fn user_id(&self) -> Option<&str> {
        match &self.delivery().target {
            NotificationTarget::DirectMessage(id) => Some(id),
            _ => None,
        }
    }
}

/// Routes one message per run.
pub struct NotificationRouter {
    mode: NotifyMode,
    /// Channel target in channel mode, fallback in DM mode.
    channel_id: Option<String>,
    webhook: Option<Box<dyn WebhookPoster>>,
    /// Present iff a bot token is configured.
    slack: Option<Box<dyn SlackApi>>,
}

impl NotificationRouter {
    pub fn new(
        mode: NotifyMode,
        channel_id: Option<String>,
        webhook: Option<Box<dyn WebhookPoster>>,
        slack: Option<Box<dyn SlackApi>>,
    ) -> Self {
        Self {
            mode,
            channel_id: channel_id.filter(|c| !c.trim().is_empty()),
            webhook,
            slack,
        }
    }

    /// Build the router and its real transports from config.
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let mode: NotifyMode = config.mode.parse()?;

        let webhook = config
            .webhook_url
            .clone()
            .map(SlackWebhook::new)
            .transpose()?
            .map(|w| Box::new(w) as Box<dyn WebhookPoster>);

        let slack = config
            .bot_token
            .clone()
            .map(|token| SlackWebClient::new(token, config.api_url.clone()))
            .transpose()?
            .map(|c| Box::new(c) as Box<dyn SlackApi>);

        Ok(Self::new(mode, config.channel_id.clone(), webhook, slack))
    }

    pub fn mode(&self) -> NotifyMode {
        self.mode
    }

    /// Check that the configured mode has somewhere to send to, without
    /// touching the network.
    pub fn validate(&self) -> Result<(), NotifyError> {
        match self.mode {
            NotifyMode::Channel => {
                if self.webhook.is_some() || (self.slack.is_some() && self.channel_id.is_some()) {
                    Ok(())
                } else {
                    Err(NotifyError::Config(
                        "channel mode needs SLACK_WEBHOOK_URL, or SLACK_BOT_TOKEN with SLACK_CHANNEL_ID"
                            .to_string(),
                    ))
                }
            }
            NotifyMode::DirectMessage => self.require_slack().map(|_| ()),
        }
    }

    /// Deliver `message`. `author` is only consulted in DM mode.
    pub async fn notify(
        &self,
        message: &SlackMessage,
        author: Option<&CommitAuthor>,
    ) -> Result<NotificationOutcome, NotifyError> {
        self.validate()?;
        match self.mode {
            NotifyMode::Channel => self.notify_channel(message).await,
            NotifyMode::DirectMessage => self.notify_direct(message, author).await,
        }
    }

    fn require_slack(&self) -> Result<&dyn SlackApi, NotifyError> {
        self.slack.as_deref().ok_or_else(|| {
            NotifyError::Config("DM mode requires SLACK_BOT_TOKEN".to_string())
        })
    }

    async fn notify_channel(&self, message: &SlackMessage) -> Result<NotificationOutcome, NotifyError> {
        if let Some(webhook) = &self.webhook {
            webhook.post(message).await?;
            tracing::info!("notification delivered via webhook");
            return Ok(NotificationOutcome::Delivered(Delivery {
                target: NotificationTarget::Webhook(webhook.url().to_string()),
                timestamp: None,
            }));
        }

        let (Some(slack), Some(channel_id)) = (&self.slack, &self.channel_id) else {
            return Err(NotifyError::Config(
                "channel mode needs SLACK_CHANNEL_ID with SLACK_BOT_TOKEN".to_string(),
            ));
        };
        let ts = slack.post_message(channel_id, message).await?;
        tracing::info!(channel = %channel_id, "notification delivered to channel");
        Ok(NotificationOutcome::Delivered(Delivery {
            target: NotificationTarget::Channel(channel_id.clone()),
            timestamp: Some(ts),
        }))
    }

    async fn notify_direct(
        &self,
        message: &SlackMessage,
        author: Option<&CommitAuthor>,
    ) -> Result<NotificationOutcome, NotifyError> {
        let slack = self.require_slack()?;

        let reason = match author.and_then(CommitAuthor::lookup_email) {
            None => FallbackReason::NoEmail,
            Some(email) => match slack.lookup_user_by_email(email).await {
                Ok(Some(user_id)) => {
                    let dm_channel = slack.open_direct_channel(&user_id).await?;
                    let ts = slack.post_message(&dm_channel, message).await?;
                    tracing::info!(user = %user_id, "notification delivered by direct message");
                    return Ok(NotificationOutcome::Delivered(Delivery {
                        target: NotificationTarget::DirectMessage(user_id),
                        timestamp: Some(ts),
                    }));
                }
                Ok(None) => FallbackReason::UserNotFound,
                Err(e) => {
                    tracing::warn!(error = %e, "Slack user lookup failed");
                    FallbackReason::LookupFailed(e.to_string())
                }
            },
        };

        let Some(channel_id) = &self.channel_id else {
            let author = author.map_or_else(|| "unknown author".to_string(), |a| a.name.clone());
            return Err(NotifyError::Resolution { author });
        };

        tracing::info!(channel = %channel_id, ?reason, "author not resolvable, using fallback channel");
        let ts = slack.post_message(channel_id, message).await?;
        Ok(NotificationOutcome::DeliveredViaFallback {
            delivery: Delivery {
                target: NotificationTarget::Channel(channel_id.clone()),
                timestamp: Some(ts),
            },
            reason,
        })
    }
}
