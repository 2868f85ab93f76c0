//! Error signatures: patterns that mark a log line as worth keeping.

use regex::{Regex, RegexBuilder};

/// A named, case-insensitive pattern, with an optional set of spans that
/// are blanked out of the line before matching.
#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    pattern: Regex,
    ignore: Option<Regex>,
}

impl Signature {
    /// Compile a case-insensitive signature.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            name: name.into(),
            pattern,
            ignore: None,
        })
    }

    /// Remove spans matching `pattern` from a line before testing it, e.g.
    /// zero counts in test summaries ("0 failed").
    pub fn ignoring(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.ignore = Some(RegexBuilder::new(pattern).case_insensitive(true).build()?);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_match(&self, line: &str) -> bool {
        match &self.ignore {
            Some(ignore) => self.pattern.is_match(&ignore.replace_all(line, "")),
            None => self.pattern.is_match(line),
        }
    }
}

/// Zero counts in test-runner summaries: "0 failed", "Failures: 0",
/// "0 errors", "errors=0".
const ZERO_FAILURES: &str = r"\b0\s+fail(ed|ures?)\b|\bfail(ed|ures?)\s*[:=]\s*0\b";
const ZERO_ERRORS: &str = r"\b0\s+errors?\b|\berrors?\s*[:=]\s*0\b";

/// Built-in signatures, in documentation precedence order, with the spans
/// each one ignores.
const DEFAULT_SIGNATURES: &[(&str, &str, Option<&str>)] = &[
    ("error", r"error", Some(ZERO_ERRORS)),
    ("exception", r"exception", None),
    ("traceback", r"traceback", None),
    ("panic", r"panic", None),
    ("fatal", r"fatal", None),
    ("failed", r"\bfail(ed|ures?|ing)?\b", Some(ZERO_FAILURES)),
    ("exit-code", r"exit (code|status) [1-9]", None),
    ("npm", r"npm err!", None),
    ("segfault", r"segmentation fault", None),
    ("assertion", r"assert(ion)?\w*\s*(error|failed)", None),
    ("not-found", r"(command|module|file) not found", None),
    ("killed", r"\b(killed|oom|out of memory)\b", None),
];

fn default_signatures() -> Result<Vec<Signature>, regex::Error> {
    DEFAULT_SIGNATURES
        .iter()
        .map(|&(name, pattern, ignore)| {
            let signature = Signature::new(name, pattern)?;
            match ignore {
                Some(ignore) => signature.ignoring(ignore),
                None => Ok(signature),
            }
        })
        .collect()
}

/// An ordered set of signatures. The first signature that matches a line
/// is reported for it; order never changes which lines are kept.
#[derive(Debug, Clone)]
pub struct SignatureSet {
    signatures: Vec<Signature>,
}

impl SignatureSet {
    pub fn new(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }

    /// Compile a set from `(name, pattern)` pairs.
    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let signatures = patterns
            .into_iter()
            .map(|(name, pattern)| Signature::new(name, pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(signatures))
    }

    /// First signature matching `line`, if any.
    pub fn first_match(&self, line: &str) -> Option<&Signature> {
        self.signatures.iter().find(|s| s.is_match(line))
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl Default for SignatureSet {
    fn default() -> Self {
        Self::new(default_signatures().expect("built-in signatures are valid regexes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        let set = SignatureSet::default();
        assert_eq!(set.first_match("ERROR: boom").unwrap().name(), "error");
        assert_eq!(set.first_match("java.lang.NullPointerException").unwrap().name(), "exception");
        assert_eq!(set.first_match("Traceback (most recent call last):").unwrap().name(), "traceback");
        assert_eq!(set.first_match("thread 'main' panicked at").unwrap().name(), "panic");
    }

    #[test]
    fn first_signature_wins() {
        let set = SignatureSet::default();
        // Matches both "error" and "exit-code"; "error" is listed first.
        let sig = set.first_match("Error: Process completed with exit code 1.").unwrap();
        assert_eq!(sig.name(), "error");
    }

    #[test]
    fn exit_code_zero_is_not_a_signature() {
        let set = SignatureSet::default();
        assert!(set.first_match("Process completed with exit code 0.").is_none());
        assert_eq!(
            set.first_match("process exited with exit code 2").unwrap().name(),
            "exit-code"
        );
    }

    #[test]
    fn ordinary_lines_do_not_match() {
        let set = SignatureSet::default();
        for line in [
            "Compiling serde v1.0.200",
            "Downloading crates ...",
            "test result: ok. 42 passed",
            "test result: ok. 42 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out",
            "===== 12 passed, 0 failed in 1.2s =====",
            "Tests run: 5, Failures: 0, Errors: 0, Skipped: 0",
            "Finished with 0 errors",
            "Run actions/checkout@v4",
            "",
        ] {
            assert!(set.first_match(line).is_none(), "unexpected match: {line}");
        }
    }

    #[test]
    fn failure_words_match_on_word_boundary() {
        let set = SignatureSet::default();
        assert!(set.first_match("test foo ... FAILED").is_some());
        assert!(set.first_match("Build failure in module x").is_some());
        assert!(set.first_match("failover configured").is_none());
    }

    #[test]
    fn nonzero_counts_still_match() {
        let set = SignatureSet::default();
        assert_eq!(
            set.first_match("test result: FAILED. 41 passed; 1 failed; 0 ignored")
                .unwrap()
                .name(),
            "failed"
        );
        assert!(set.first_match("===== 10 failed, 2 passed in 3.4s =====").is_some());
        assert!(set.first_match("Tests run: 5, Failures: 2, Errors: 0").is_some());
        // Ignored spans are per signature: a real error next to a zero count still counts.
        assert_eq!(
            set.first_match("0 errors so far; error[E0308]: mismatched types")
                .unwrap()
                .name(),
            "error"
        );
    }

    #[test]
    fn ignoring_blanks_spans_before_matching() {
        let sig = Signature::new("warn", r"warn").unwrap().ignoring(r"\b0 warnings").unwrap();
        assert!(!sig.is_match("build finished, 0 warnings"));
        assert!(sig.is_match("build finished, 3 warnings"));
    }

    #[test]
    fn custom_patterns() {
        let set = SignatureSet::from_patterns([("boom", r"kaboom \d+")]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.first_match("KABOOM 7").is_some());
        assert!(set.first_match("kaboom").is_none());
        assert!(SignatureSet::from_patterns([("bad", r"(unclosed")]).is_err());
    }
}
