//! Slack delivery for CI failure summaries.
//!
//! This crate provides:
//! - `SlackApi` and `WebhookPoster` traits over the two Slack transports
//! - Incoming-webhook and bot-token Web API implementations
//! - Minijinja rendering of the Block Kit message
//! - `NotificationRouter`, which picks the destination and handles the
//!   DM-to-channel fallback

pub mod router;
pub mod slack;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use router::{
    Delivery, FallbackReason, NotificationOutcome, NotificationRouter, NotificationTarget,
    NotifyMode,
};
pub use slack::SlackWebClient;
pub use templating::{MessageContext, MessageRenderer};
pub use traits::{NotifyError, SendStep, SlackApi, SlackMessage, WebhookPoster};
pub use webhook::SlackWebhook;
