//! Prompt assembly.
//!
//! The excerpt is embedded in a fixed-shape minijinja template together
//! with the run metadata. A built-in template is used unless a custom one
//! is supplied.

use std::path::Path;

use redlight_core::RunMetadata;
use serde::Serialize;

use crate::provider::LlmError;

const DEFAULT_TEMPLATE: &str = r#"You are a CI assistant. A GitHub Actions workflow run failed and you are given an excerpt of its logs.

Workflow: {{ run.workflow }}
Branch: {{ run.branch }}
Commit: {{ run.commit }} by {{ run.author.name }}
Failed jobs: {{ failed_jobs | join(", ") }}

{% if strategy == "windowed" -%}
The excerpt only contains the lines around detected errors. "{{ skipped_marker }}" marks omitted sections.
{%- else -%}
No error lines were detected automatically. The excerpt is the last {{ line_count }} lines of the log.
{%- endif %}
{%- if truncated %} Older lines were cut to fit the budget.{% endif %}

```
{{ excerpt }}
```

Answer in Slack mrkdwn, at most 8 lines:
1. *Root cause*: one or two sentences.
2. *Where*: the failing step, test or file.
3. *Suggested fix*: concrete next action.
"#;

/// Values exposed to the prompt template.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext<'a> {
    pub run: &'a RunMetadata,
    pub failed_jobs: Vec<&'a str>,
    /// `"windowed"` or `"tail"`.
    pub strategy: &'a str,
    pub excerpt: String,
    pub line_count: usize,
    pub truncated: bool,
    pub skipped_marker: &'a str,
}

/// A validated prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    pub fn builtin() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Parse `source`, rejecting syntax errors up front.
    pub fn new(source: impl Into<String>) -> Result<Self, LlmError> {
        let source = source.into();
        minijinja::Environment::new()
            .template_from_str(&source)
            .map_err(|e| LlmError::Template(e.to_string()))?;
        Ok(Self { source })
    }

    pub fn from_file(path: &Path) -> Result<Self, LlmError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            LlmError::Template(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::new(source)
    }

    pub fn render(&self, ctx: &PromptContext<'_>) -> Result<String, LlmError> {
        let env = minijinja::Environment::new();
        env.render_str(&self.source, ctx)
            .map_err(|e| LlmError::Template(e.to_string()))
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use redlight_core::CommitAuthor;

    use super::*;

    fn run() -> RunMetadata {
        RunMetadata {
            run_id: 42,
            workflow: "CI".into(),
            branch: "main".into(),
            commit: "abc1234".into(),
            author: CommitAuthor::new("Ada", Some("ada@example.com".into())),
            url: "https://github.com/acme/widgets/actions/runs/42".into(),
        }
    }

    fn ctx<'a>(run: &'a RunMetadata, strategy: &'a str) -> PromptContext<'a> {
        PromptContext {
            run,
            failed_jobs: vec!["build", "test"],
            strategy,
            excerpt: "error: cannot find value `x`".into(),
            line_count: 1,
            truncated: false,
            skipped_marker: "... [skipped lines] ...",
        }
    }

    #[test]
    fn builtin_renders_metadata_and_excerpt() {
        let run = run();
        let prompt = PromptTemplate::builtin().render(&ctx(&run, "windowed")).unwrap();
        assert!(prompt.contains("Workflow: CI"));
        assert!(prompt.contains("Commit: abc1234 by Ada"));
        assert!(prompt.contains("Failed jobs: build, test"));
        assert!(prompt.contains("error: cannot find value `x`"));
        assert!(prompt.contains("[skipped lines]"));
    }

    #[test]
    fn tail_strategy_changes_wording() {
        let run = run();
        let prompt = PromptTemplate::builtin().render(&ctx(&run, "tail")).unwrap();
        assert!(prompt.contains("No error lines were detected"));
        assert!(!prompt.contains("[skipped lines]"));
    }

    #[test]
    fn invalid_template_is_rejected() {
        let err = PromptTemplate::new("{{ unclosed").unwrap_err();
        assert!(matches!(err, LlmError::Template(_)));
    }

    #[test]
    fn custom_template_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{{{ run.workflow }}}} on {{{{ run.branch }}}}: {{{{ excerpt }}}}").unwrap();
        let template = PromptTemplate::from_file(file.path()).unwrap();
        let run = run();
        assert_eq!(
            template.render(&ctx(&run, "windowed")).unwrap(),
            "CI on main: error: cannot find value `x`"
        );
    }

    #[test]
    fn missing_file_is_template_error() {
        let err = PromptTemplate::from_file(Path::new("/definitely/not/here.j2")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
