use serde::{Deserialize, Serialize};

/// Metadata about the workflow run being analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: u64,
    pub workflow: String,
    pub branch: String,
    /// Abbreviated commit hash (7 characters).
    pub commit: String,
    pub author: CommitAuthor,
    /// Human-facing URL of the run.
    pub url: String,
}

/// Author of the head commit. Only used as a lookup key when resolving
/// who to notify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: Option<String>,
}

impl CommitAuthor {
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            name: name.into(),
            email: email.filter(|e| !e.trim().is_empty()),
        }
    }

    /// GitHub's privacy-preserving `noreply` addresses never resolve to a
    /// workspace member.
    pub fn lookup_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .filter(|e| !e.ends_with("@users.noreply.github.com"))
    }
}

/// A job of the run that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedJob {
    pub id: u64,
    pub name: String,
}

/// Shorten a full commit SHA to the 7-character form.
pub fn short_sha(sha: &str) -> String {
    sha.chars().take(7).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_email_is_dropped() {
        let author = CommitAuthor::new("Ada", Some("  ".into()));
        assert!(author.email.is_none());
        assert!(author.lookup_email().is_none());
    }

    #[test]
    fn noreply_email_is_not_a_lookup_key() {
        let author = CommitAuthor::new(
            "Ada",
            Some("123+ada@users.noreply.github.com".into()),
        );
        assert!(author.email.is_some());
        assert!(author.lookup_email().is_none());

        let author = CommitAuthor::new("Ada", Some("ada@example.com".into()));
        assert_eq!(author.lookup_email(), Some("ada@example.com"));
    }

    #[test]
    fn short_sha_truncates() {
        assert_eq!(short_sha("0123456789abcdef"), "0123456");
        assert_eq!(short_sha("abc"), "abc");
    }
}
