use crate::domain::commit::CommitId;
use std::fmt;

/// A branch reference in the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Branch {
    pub name: String,
    pub tip: CommitId,
    pub is_remote: bool,
}

impl Branch {
    /// Create a local branch
    pub fn new(name: impl Into<String>, tip: CommitId) -> Self {
        Branch {
            name: name.into(),
            tip,
            is_remote: false,
        }
    }

    pub fn remote(name: impl Into<String>, tip: CommitId) -> Self {
        Branch {
            name: name.into(),
            tip,
            is_remote: true,
        }
    }

    /// Name without ref or remote prefixes, used for classification
    pub fn friendly_name(&self) -> String {
        friendly_name(&self.name, self.is_remote)
    }
}

/// Strip `refs/heads/`, `refs/remotes/<remote>/` and `origin/` prefixes
pub fn friendly_name(name: &str, is_remote: bool) -> String {
    if let Some(rest) = name.strip_prefix("refs/heads/") {
        return rest.to_string();
    }
    if let Some(rest) = name.strip_prefix("refs/remotes/") {
        return rest.split_once('/').map_or(rest, |(_, branch)| branch).to_string();
    }
    if is_remote {
        return name.split_once('/').map_or(name, |(_, branch)| branch).to_string();
    }
    name.strip_prefix("origin/").unwrap_or(name).to_string()
}

/// Replace characters that may not appear in a version label with `-`
pub fn escape_branch_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Classification of a branch name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchType {
    Main,
    Develop,
    Release,
    Feature,
    Hotfix,
    Support,
    PullRequest,
    Custom(String),
    Unknown,
}

impl BranchType {
    /// Built-in types in classification order (unknown always last)
    pub const BUILT_IN: [BranchType; 7] = [
        BranchType::Main,
        BranchType::Release,
        BranchType::Develop,
        BranchType::Support,
        BranchType::Hotfix,
        BranchType::Feature,
        BranchType::PullRequest,
    ];

    /// Map a configuration key to a branch type
    pub fn from_key(key: &str) -> Self {
        match key.to_ascii_lowercase().replace('_', "-").as_str() {
            "main" | "master" => BranchType::Main,
            "develop" => BranchType::Develop,
            "release" => BranchType::Release,
            "feature" => BranchType::Feature,
            "hotfix" => BranchType::Hotfix,
            "support" => BranchType::Support,
            "pull-request" => BranchType::PullRequest,
            "unknown" => BranchType::Unknown,
            _ => BranchType::Custom(key.to_string()),
        }
    }

    /// Configuration key of this type
    pub fn key(&self) -> &str {
        match self {
            BranchType::Main => "main",
            BranchType::Develop => "develop",
            BranchType::Release => "release",
            BranchType::Feature => "feature",
            BranchType::Hotfix => "hotfix",
            BranchType::Support => "support",
            BranchType::PullRequest => "pull-request",
            BranchType::Custom(name) => name,
            BranchType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
