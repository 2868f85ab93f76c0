//! Windowed excerpt extraction.
//!
//! Every line matching a [`SignatureSet`] registers an inclusive window of
//! `context_radius` lines on either side. Windows are unioned into one
//! increasing index set; a single [`SKIPPED_MARKER`] line separates runs of
//! indices that are not contiguous. When the merged result is longer than
//! `max_lines`, only the trailing `max_lines` lines are kept. That cut is
//! not re-merged, so a truncated excerpt can begin in the middle of a
//! window.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::corpus::{is_job_marker, LogCorpus};
use crate::signature::SignatureSet;

/// Separator inserted between non-adjacent windows.
pub const SKIPPED_MARKER: &str = "... [skipped lines] ...";

/// Limits applied to an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub max_lines: usize,
    pub context_radius: usize,
}

/// Inclusive line range `[start, end]` kept around one matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchWindow {
    pub start: usize,
    pub end: usize,
    /// Index of the line that matched.
    pub line: usize,
    /// Name of the first signature that matched it.
    pub signature: String,
}

/// How an excerpt was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcerptStrategy {
    /// Context windows around matched error lines.
    Windowed,
    /// Trailing lines of the raw corpus (nothing matched).
    Tail,
}

impl ExcerptStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windowed => "windowed",
            Self::Tail => "tail",
        }
    }
}

/// Bounded, ordered lines handed to the summarisation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Excerpt {
    lines: Vec<String>,
    strategy: ExcerptStrategy,
    /// Length before the `max_lines` cut.
    untruncated_len: usize,
}

impl Excerpt {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn strategy(&self) -> ExcerptStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.untruncated_len > self.lines.len()
    }

    /// Lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Scan the corpus once and return a window for every matching line, in
/// line order. Job boundary markers are never matched, though they can
/// appear as context.
pub fn match_windows(
    corpus: &LogCorpus,
    context_radius: usize,
    signatures: &SignatureSet,
) -> Vec<MatchWindow> {
    let Some(last) = corpus.len().checked_sub(1) else {
        return Vec::new();
    };

    corpus
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| !is_job_marker(line))
        .filter_map(|(i, line)| {
            signatures.first_match(line).map(|sig| MatchWindow {
                start: i.saturating_sub(context_radius),
                end: i.saturating_add(context_radius).min(last),
                line: i,
                signature: sig.name().to_string(),
            })
        })
        .collect()
}

/// Build a windowed excerpt, or `None` when no line matched any signature.
///
/// `None` is the caller's cue to fall back to [`tail`]; it is never an
/// empty excerpt.
pub fn extract(
    corpus: &LogCorpus,
    options: &ExtractOptions,
    signatures: &SignatureSet,
) -> Option<Excerpt> {
    let windows = match_windows(corpus, options.context_radius, signatures);
    if windows.is_empty() {
        tracing::debug!(lines = corpus.len(), "no error signatures matched");
        return None;
    }

    let kept: BTreeSet<usize> = windows.iter().flat_map(|w| w.start..=w.end).collect();

    let mut lines = Vec::with_capacity(kept.len());
    let mut previous: Option<usize> = None;
    for idx in kept {
        if matches!(previous, Some(p) if idx != p + 1) {
            lines.push(SKIPPED_MARKER.to_string());
        }
        lines.push(corpus.lines()[idx].clone());
        previous = Some(idx);
    }

    let untruncated_len = lines.len();
    if untruncated_len > options.max_lines {
        lines.drain(..untruncated_len - options.max_lines);
    }

    tracing::debug!(
        matches = windows.len(),
        merged = untruncated_len,
        kept = lines.len(),
        "extracted windowed excerpt"
    );

    Some(Excerpt {
        lines,
        strategy: ExcerptStrategy::Windowed,
        untruncated_len,
    })
}

/// Fallback: the trailing `max_lines` lines of the corpus, verbatim.
pub fn tail(corpus: &LogCorpus, max_lines: usize) -> Excerpt {
    let all = corpus.lines();
    let start = all.len().saturating_sub(max_lines);
    Excerpt {
        lines: all[start..].to_vec(),
        strategy: ExcerptStrategy::Tail,
        untruncated_len: all.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(lines: &[&str]) -> LogCorpus {
        LogCorpus::from_lines(lines.iter().map(|l| l.to_string()).collect())
    }

    fn opts(max_lines: usize, context_radius: usize) -> ExtractOptions {
        ExtractOptions {
            max_lines,
            context_radius,
        }
    }

    #[test]
    fn job_markers_are_not_matched() {
        let mut builder = crate::CorpusBuilder::new();
        builder
            .push_job("error-prone", 1, "compiling\nall good")
            .push_job("test-failure-report", 2, "done")
            .skip_job("fatal-checks", 3);
        let corpus = builder.build();
        let set = SignatureSet::default();

        assert!(match_windows(&corpus, 2, &set).is_empty());
        assert!(extract(&corpus, &opts(50, 2), &set).is_none());
    }

    #[test]
    fn marker_is_kept_as_context() {
        let mut builder = crate::CorpusBuilder::new();
        builder.push_job("build", 1, "error: boom");
        let excerpt = extract(&builder.build(), &opts(50, 1), &SignatureSet::default()).unwrap();
        assert_eq!(excerpt.lines(), ["===== Job: build (#1) =====", "error: boom"]);
    }

    #[test]
    fn windows_are_clamped_to_corpus_bounds() {
        let c = corpus(&["error at start", "a", "b", "c", "error at end"]);
        let windows = match_windows(&c, 2, &SignatureSet::default());
        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start, windows[0].end), (0, 2));
        assert_eq!((windows[1].start, windows[1].end), (2, 4));
        assert_eq!(windows[0].signature, "error");
    }

    #[test]
    fn huge_radius_does_not_overflow() {
        let c = corpus(&["a", "error", "b"]);
        let windows = match_windows(&c, usize::MAX, &SignatureSet::default());
        assert_eq!((windows[0].start, windows[0].end), (0, 2));
    }

    #[test]
    fn empty_corpus_has_no_match() {
        let c = LogCorpus::default();
        assert!(extract(&c, &opts(10, 3), &SignatureSet::default()).is_none());
        assert!(tail(&c, 10).is_empty());
    }

    #[test]
    fn overlapping_windows_merge_without_separator() {
        let c = corpus(&["a", "b", "error one", "c", "error two", "d", "e"]);
        let excerpt = extract(&c, &opts(100, 1), &SignatureSet::default()).unwrap();
        assert_eq!(excerpt.lines(), &["b", "error one", "c", "error two", "d"]);
        assert!(!excerpt.lines().iter().any(|l| l == SKIPPED_MARKER));
    }

    #[test]
    fn adjacent_windows_merge_without_separator() {
        // Windows [1,3] and [4,6] touch.
        let c = corpus(&["a", "b", "error one", "c", "d", "error two", "e", "f"]);
        let excerpt = extract(&c, &opts(100, 1), &SignatureSet::default()).unwrap();
        assert_eq!(
            excerpt.lines(),
            &["b", "error one", "c", "d", "error two", "e"]
        );
    }

    #[test]
    fn distant_windows_get_one_separator() {
        let mut lines = vec!["ok"; 30];
        lines[5] = "error one";
        lines[25] = "error two";
        let c = corpus(&lines);
        let excerpt = extract(&c, &opts(100, 2), &SignatureSet::default()).unwrap();
        let separators = excerpt.lines().iter().filter(|l| *l == SKIPPED_MARKER).count();
        assert_eq!(separators, 1);
        assert_eq!(excerpt.len(), 5 + 1 + 5);
        assert_eq!(excerpt.lines()[2], "error one");
        assert_eq!(excerpt.lines()[5], SKIPPED_MARKER);
        assert_eq!(excerpt.lines()[8], "error two");
    }

    #[test]
    fn over_budget_keeps_trailing_lines_without_remerging() {
        let mut lines = vec!["ok"; 40];
        lines[5] = "error one";
        lines[30] = "error two";
        let c = corpus(&lines);
        let full = extract(&c, &opts(1000, 3), &SignatureSet::default()).unwrap();
        assert_eq!(full.len(), 7 + 1 + 7);
        assert!(!full.is_truncated());

        let cut = extract(&c, &opts(10, 3), &SignatureSet::default()).unwrap();
        assert_eq!(cut.len(), 10);
        assert!(cut.is_truncated());
        assert_eq!(cut.lines(), &full.lines()[full.len() - 10..]);
        // Starts mid-window, no leading separator added back.
        assert_eq!(cut.lines()[0], "ok");
        assert_eq!(cut.lines()[2], SKIPPED_MARKER);
    }

    #[test]
    fn tail_takes_trailing_lines_verbatim() {
        let c = corpus(&["1", "2", "3", "4", "5"]);
        let t = tail(&c, 2);
        assert_eq!(t.lines(), &["4", "5"]);
        assert_eq!(t.strategy(), ExcerptStrategy::Tail);
        assert!(t.is_truncated());
        assert_eq!(tail(&c, 50).len(), 5);
    }

    #[test]
    fn text_joins_lines() {
        let c = corpus(&["x", "error", "y"]);
        let excerpt = extract(&c, &opts(10, 1), &SignatureSet::default()).unwrap();
        assert_eq!(excerpt.text(), "x\nerror\ny");
        assert_eq!(excerpt.strategy().as_str(), "windowed");
    }
}
