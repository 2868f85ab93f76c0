//! Minijinja rendering of failure notifications into Slack Block Kit.
//!
//! Short text pieces (header, fields, context line, plain-text fallback)
//! are minijinja templates; the block structure around them is fixed.
//! Templates are constant strings, so a fresh [`minijinja::Environment`]
//! is created per render call.

use redlight_core::RunMetadata;
use serde_json::json;

use crate::traits::{NotifyError, SlackMessage};

/// Slack rejects section text longer than this.
const SECTION_TEXT_LIMIT: usize = 3000;
/// Slack rejects header text longer than this.
const HEADER_TEXT_LIMIT: usize = 150;
/// Per-field limit inside a section's `fields`.
const FIELD_TEXT_LIMIT: usize = 2000;

const HEADER_TEMPLATE: &str = "❌ {{ run.workflow }} failed";
const FALLBACK_TEMPLATE: &str = "{{ run.workflow | slack_escape }} failed on {{ run.branch | slack_escape }} \
({{ run.commit }}): {{ run.url }}";
const FIELD_TEMPLATES: &[&str] = &[
    "*Branch*\n`{{ run.branch | slack_escape }}`",
    "*Commit*\n`{{ run.commit }}`",
    "*Author*\n{{ run.author.name | slack_escape }}",
    "*Failed jobs*\n{{ failed_jobs | join(', ') | slack_escape }}",
];
const CONTEXT_TEMPLATE: &str = "<{{ run.url }}|View run> · {{ now }}";

/// Context data available to notification templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MessageContext {
    /// Run the notification is about.
    pub run: RunMetadata,
    /// AI-written summary (Slack mrkdwn).
    pub summary: String,
    /// Names of the failed jobs, in listing order.
    pub failed_jobs: Vec<String>,
    /// Current timestamp in ISO 8601 format.
    pub now: String,
}

impl MessageContext {
    pub fn new(run: RunMetadata, summary: String, failed_jobs: Vec<String>) -> Self {
        Self {
            run,
            summary,
            failed_jobs,
            now: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }
}

/// Renders [`MessageContext`] into a [`SlackMessage`].
#[derive(Debug, Default)]
pub struct MessageRenderer {
    _private: (),
}

impl MessageRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Build a configured minijinja environment with custom filters.
    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("slack_escape", slack_escape_filter);
        env
    }

    fn render_str(&self, template_str: &str, ctx: &MessageContext) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Render the full message.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if a template fails to render.
    pub fn render(&self, ctx: &MessageContext) -> Result<SlackMessage, NotifyError> {
        let header = self.render_str(HEADER_TEMPLATE, ctx)?;
        let context = self.render_str(CONTEXT_TEMPLATE, ctx)?;
        let text = self.render_str(FALLBACK_TEMPLATE, ctx)?;

        let fields = FIELD_TEMPLATES
            .iter()
            .map(|tmpl| {
                let rendered = self.render_str(tmpl, ctx)?;
                Ok(json!({
                    "type": "mrkdwn",
                    "text": truncate_chars(&rendered, FIELD_TEXT_LIMIT),
                }))
            })
            .collect::<Result<Vec<_>, NotifyError>>()?;

        let blocks = vec![
            json!({
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": truncate_chars(&header, HEADER_TEXT_LIMIT),
                    "emoji": true,
                },
            }),
            json!({ "type": "section", "fields": fields }),
            json!({
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": truncate_chars(&ctx.summary, SECTION_TEXT_LIMIT),
                },
            }),
            json!({
                "type": "context",
                "elements": [{ "type": "mrkdwn", "text": context }],
            }),
        ];

        Ok(SlackMessage { text, blocks })
    }
}

/// Escape the three characters Slack treats as control sequences.
pub fn slack_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn slack_escape_filter(value: String) -> String {
    slack_escape(&value)
}

/// Cut `text` to at most `max` characters, ending with an ellipsis when
/// shortened.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
