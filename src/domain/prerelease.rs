//! Pre-release tags for semantic versions
//!
//! A pre-release tag is a textual label with an optional trailing counter,
//! e.g. `beta.1`, `alpha`, or a bare counter such as `1` when the branch label
//! is empty. According to semver.org: https://semver.org/#spec-item-9

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

fn pre_release_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<label>.*?)\.?(?P<number>\d+)?$").expect("static pre-release regex")
    })
}

/// Pre-release label with an optional counter
///
/// # Examples
/// - `"beta.1"` -> label `beta`, number `1`
/// - `"alpha"` -> label `alpha`, no number
/// - `"3"` -> empty label, number `3`
#[derive(Debug, Clone, Default)]
pub struct PreReleaseTag {
    /// The textual part (may be empty)
    pub label: Option<String>,
    /// The trailing counter, if any
    pub number: Option<u64>,
}

impl PreReleaseTag {
    /// Create a new pre-release tag
    pub fn new(label: impl Into<String>, number: Option<u64>) -> Self {
        PreReleaseTag {
            label: Some(label.into()),
            number,
        }
    }

    /// The tag of a released version
    pub fn empty() -> Self {
        PreReleaseTag::default()
    }

    /// Parse a pre-release string such as `beta.1`
    ///
    /// The label is everything up to the trailing numeric component; a dot
    /// separating the two is optional (`beta1` parses like `beta.1`).
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return PreReleaseTag::empty();
        }

        match pre_release_regex().captures(s) {
            Some(captures) => {
                let label = captures
                    .name("label")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                let number = captures
                    .name("number")
                    .and_then(|m| m.as_str().parse::<u64>().ok());
                PreReleaseTag {
                    label: Some(label),
                    number,
                }
            }
            None => PreReleaseTag::new(s, None),
        }
    }

    /// The label text, empty when absent
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }

    /// A released version carries neither label nor number
    pub fn is_empty(&self) -> bool {
        self.label().is_empty() && self.number.is_none()
    }

    /// Whether this tag was produced for the given branch label
    pub fn has_label(&self, label: &str) -> bool {
        self.label() == label
    }

    /// Increment the counter
    ///
    /// If no counter is present the result starts at 1.
    pub fn increment_number(&self) -> Self {
        PreReleaseTag {
            label: self.label.clone(),
            number: Some(self.number.map_or(1, |n| n.saturating_add(1))),
        }
    }
}

/// A missing label equals an empty one, matching [`Ord`].
impl PartialEq for PreReleaseTag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PreReleaseTag {}

impl Hash for PreReleaseTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.is_empty() {
            return;
        }
        self.label().hash(state);
        self.number.hash(state);
    }
}

impl PartialOrd for PreReleaseTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PreReleaseTag {
    /// Released (empty) tags sort above every pre-release.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self
                .label()
                .cmp(other.label())
                .then_with(|| self.number.cmp(&other.number)),
        }
    }
}

impl fmt::Display for PreReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.label();
        match (label.is_empty(), self.number) {
            (true, None) => Ok(()),
            (true, Some(n)) => write!(f, "{}", n),
            (false, None) => write!(f, "{}", label),
            (false, Some(n)) => write!(f, "{}.{}", label, n),
        }
    }
}
