use crate::domain::version::VersionField;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Content address of a commit (hex object id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        CommitId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, as printed by `git log --oneline`
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(7) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        CommitId::new(id)
    }
}

/// An immutable commit in the graph snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: CommitId,
    /// Parents in order; the first parent is the branch the commit was made on
    pub parents: Vec<CommitId>,
    pub author_time: DateTime<Utc>,
    pub committer_time: DateTime<Utc>,
    pub message: String,
    /// Paths changed relative to the first parent, when known
    pub paths: Vec<String>,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn first_parent(&self) -> Option<&CommitId> {
        self.parents.first()
    }

    /// First line of the message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

fn scoped_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z]+)\(([^)]+)\)(!?):\s*(.*)").expect("static regex"))
}

fn breaking_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z]+)!:\s*(.*)").expect("static regex"))
}

fn plain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z]+):\s*(.*)").expect("static regex"))
}

fn has_breaking_footer(message: &str) -> bool {
    message.contains("BREAKING CHANGE:") || message.contains("BREAKING-CHANGE:")
}

/// Parsed representation of a conventional commit header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

impl ParsedCommit {
    /// Parse a commit message according to the conventional commits format
    ///
    /// Supports formats:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    ///
    /// Returns `None` for messages that do not follow the format.
    pub fn parse(message: &str) -> Option<Self> {
        let header = message.lines().next().unwrap_or("");

        if let Some(captures) = scoped_regex().captures(header) {
            let has_exclamation = captures.get(3).map(|m| m.as_str()) == Some("!");
            return Some(ParsedCommit {
                r#type: captures[1].to_string(),
                scope: Some(captures[2].to_string()),
                description: captures[4].to_string(),
                is_breaking_change: has_exclamation || has_breaking_footer(message),
            });
        }

        if let Some(captures) = breaking_regex().captures(header) {
            return Some(ParsedCommit {
                r#type: captures[1].to_string(),
                scope: None,
                description: captures[2].to_string(),
                is_breaking_change: true,
            });
        }

        if let Some(captures) = plain_regex().captures(header) {
            return Some(ParsedCommit {
                r#type: captures[1].to_string(),
                scope: None,
                description: captures[2].to_string(),
                is_breaking_change: has_breaking_footer(message),
            });
        }

        None
    }

    /// Version component this commit asks for, if any
    pub fn increment(&self) -> Option<VersionField> {
        if self.is_breaking_change {
            return Some(VersionField::Major);
        }
        match self.r#type.as_str() {
            "feat" | "feature" => Some(VersionField::Minor),
            "fix" | "perf" => Some(VersionField::Patch),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        let id = CommitId::new("0123456789abcdef");
        assert_eq!(id.short(), "0123456");
        assert_eq!(CommitId::new("abc").short(), "abc");
    }

    #[test]
    fn test_parse_with_scope() {
        let commit = ParsedCommit::parse("feat(auth): add login").unwrap();
        assert_eq!(commit.r#type, "feat");
        assert_eq!(commit.scope, Some("auth".to_string()));
        assert_eq!(commit.description, "add login");
        assert!(!commit.is_breaking_change);
        assert_eq!(commit.increment(), Some(VersionField::Minor));
    }

    #[test]
    fn test_parse_with_breaking_marker() {
        let commit = ParsedCommit::parse("feat(auth)!: redesign login").unwrap();
        assert!(commit.is_breaking_change);
        assert_eq!(commit.increment(), Some(VersionField::Major));
    }

    #[test]
    fn test_parse_breaking_without_scope() {
        let commit = ParsedCommit::parse("fix!: redesign").unwrap();
        assert_eq!(commit.scope, None);
        assert_eq!(commit.increment(), Some(VersionField::Major));
    }

    #[test]
    fn test_parse_non_conventional() {
        assert_eq!(ParsedCommit::parse("Random commit message"), None);
    }

    #[test]
    fn test_parse_breaking_change_footer() {
        let commit = ParsedCommit::parse("fix: something\n\nBREAKING CHANGE: desc").unwrap();
        assert!(commit.is_breaking_change);
    }

    #[test]
    fn test_chore_has_no_increment() {
        let commit = ParsedCommit::parse("chore: bump deps").unwrap();
        assert_eq!(commit.increment(), None);
        let commit = ParsedCommit::parse("perf(db): cache").unwrap();
        assert_eq!(commit.increment(), Some(VersionField::Patch));
    }
}
