use crate::domain::branch::friendly_name;
use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// Built-in merge commit subject formats, tried after any configured ones
const DEFAULT_FORMATS: [(&str, &str); 6] = [
    (
        "Default",
        r"^Merge (?:branch|tag) '(?P<SourceBranch>[^']*)'(?: into (?P<TargetBranch>[^\s]*))*",
    ),
    (
        "SmartGit",
        r"^Finish (?P<SourceBranch>[^\s]*)(?: into (?P<TargetBranch>[^\s]*))*",
    ),
    (
        "BitBucketPull",
        r"^Merge pull request #(?P<PullRequestNumber>\d+) (?:from|in) (?P<Source>.*) from (?P<SourceBranch>[^\s]*) to (?P<TargetBranch>[^\s]*)",
    ),
    (
        "BitBucketPullv7",
        r"^Pull request #(?P<PullRequestNumber>\d+).*\r?\n\r?\nMerge in (?P<Source>.*) from (?P<SourceBranch>[^\s]*) to (?P<TargetBranch>[^\s]*)",
    ),
    (
        "GitHubPull",
        r"^Merge pull request #(?P<PullRequestNumber>\d+) (?:from|in) (?:[^\s/]+/)?(?P<SourceBranch>[^\s]*)(?: into (?P<TargetBranch>[^\s]*))*",
    ),
    (
        "RemoteTracking",
        r"^Merge remote-tracking branch '(?P<SourceBranch>[^\s]*)'(?: into (?P<TargetBranch>[^\s]*))*",
    ),
];

/// Information recovered from a merge commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeMessage {
    pub format: String,
    pub merged_branch: String,
    pub target_branch: Option<String>,
    pub pull_request_number: Option<u64>,
}

/// Ordered list of compiled merge message formats
#[derive(Debug, Clone)]
pub struct MergeMessageFormats {
    formats: Vec<(String, Regex)>,
}

impl MergeMessageFormats {
    /// Configured formats first, then the built-in ones
    pub fn new(custom: &BTreeMap<String, String>) -> Result<Self> {
        let mut formats = Vec::with_capacity(custom.len() + DEFAULT_FORMATS.len());
        for (name, pattern) in custom {
            formats.push((name.clone(), Error::compile(pattern)?));
        }
        for (name, pattern) in DEFAULT_FORMATS {
            formats.push((name.to_string(), Error::compile(pattern)?));
        }
        Ok(MergeMessageFormats { formats })
    }

    pub fn parse(&self, message: &str) -> Option<MergeMessage> {
        self.formats.iter().find_map(|(name, regex)| {
            let captures = regex.captures(message)?;
            let source = captures.name("SourceBranch")?.as_str();
            if source.is_empty() {
                return None;
            }
            let is_remote = name == "RemoteTracking";
            Some(MergeMessage {
                format: name.clone(),
                merged_branch: friendly_name(source, is_remote),
                target_branch: captures
                    .name("TargetBranch")
                    .map(|m| m.as_str().to_string())
                    .filter(|s| !s.is_empty()),
                pull_request_number: captures
                    .name("PullRequestNumber")
                    .and_then(|m| m.as_str().parse().ok()),
            })
        })
    }
}

impl Default for MergeMessageFormats {
    fn default() -> Self {
        MergeMessageFormats::new(&BTreeMap::new()).expect("built-in merge formats compile")
    }
}
