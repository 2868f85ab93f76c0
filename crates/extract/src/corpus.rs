//! Log corpus assembly.
//!
//! A [`LogCorpus`] is the ordered concatenation of every failed job's log,
//! each preceded by a boundary marker line. Jobs are appended one at a time
//! in the order the caller supplies them, so the corpus is stable across
//! runs for the same job listing.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z ?")
        .expect("Failed to compile timestamp prefix regex")
});

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("Failed to compile ANSI regex")
});

const MARKER_PREFIX: &str = "===== Job: ";
const MARKER_SUFFIX: &str = " =====";

/// Whether `line` is a job boundary marker written by [`CorpusBuilder`].
/// Markers carry job names, which are never evidence of an error.
pub fn is_job_marker(line: &str) -> bool {
    line.starts_with(MARKER_PREFIX) && line.ends_with(MARKER_SUFFIX)
}

/// Immutable, ordered sequence of log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCorpus {
    lines: Vec<String>,
}

impl LogCorpus {
    /// Split raw text into lines verbatim (no normalisation).
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Bookkeeping for one job that went into (or was left out of) a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobEntry {
    pub id: u64,
    pub name: String,
    /// Number of log lines appended; `None` if the log was unavailable.
    pub lines: Option<usize>,
}

/// Incrementally builds a [`LogCorpus`] from per-job logs.
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    lines: Vec<String>,
    jobs: Vec<JobEntry>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boundary marker line placed before each job's log.
    pub fn job_marker(name: &str, id: u64) -> String {
        format!("{MARKER_PREFIX}{name} (#{id}){MARKER_SUFFIX}")
    }

    /// Append one job's raw log, normalising each line.
    pub fn push_job(&mut self, name: &str, id: u64, raw_log: &str) -> &mut Self {
        self.lines.push(Self::job_marker(name, id));
        let before = self.lines.len();
        self.lines.extend(raw_log.lines().map(normalize_line));
        let appended = self.lines.len() - before;

        tracing::debug!(job = %name, job_id = id, lines = appended, "appended job log");
        self.jobs.push(JobEntry {
            id,
            name: name.to_string(),
            lines: Some(appended),
        });
        self
    }

    /// Record a job whose log could not be fetched. The corpus gets a marker
    /// so the reader knows the job existed.
    pub fn skip_job(&mut self, name: &str, id: u64) -> &mut Self {
        self.lines
            .push(format!("{MARKER_PREFIX}{name} (#{id}) log unavailable{MARKER_SUFFIX}"));
        self.jobs.push(JobEntry {
            id,
            name: name.to_string(),
            lines: None,
        });
        self
    }

    pub fn jobs(&self) -> &[JobEntry] {
        &self.jobs
    }

    /// Number of jobs whose log was actually appended.
    pub fn included_jobs(&self) -> usize {
        self.jobs.iter().filter(|j| j.lines.is_some()).count()
    }

    pub fn build(self) -> LogCorpus {
        LogCorpus { lines: self.lines }
    }
}

/// Strip the runner's timestamp prefix and ANSI colour codes.
pub fn normalize_line(line: &str) -> String {
    let without_ts = TIMESTAMP_PREFIX.replace(line, "");
    ANSI_ESCAPE.replace_all(&without_ts, "").into_owned()
}
