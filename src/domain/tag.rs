use crate::domain::commit::CommitId;
use crate::domain::version::{SemanticVersion, SemanticVersionFormat};
use chrono::{DateTime, Utc};
use regex::Regex;

/// Represents a git tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// Commit the tag points at (annotated tags are peeled)
    pub target: CommitId,
    pub annotation_time: Option<DateTime<Utc>>,
}

impl Tag {
    /// Create a lightweight tag
    pub fn new(name: impl Into<String>, target: CommitId) -> Self {
        Tag {
            name: name.into(),
            target,
            annotation_time: None,
        }
    }

    /// Extract the version carried by the tag name
    ///
    /// `prefix` is matched at the start of the name and stripped
    /// (e.g. `[vV]?` turns `v1.2.3` into `1.2.3`).
    pub fn version(&self, prefix: &Regex, format: SemanticVersionFormat) -> Option<SemanticVersion> {
        let name = self.name.strip_prefix("refs/tags/").unwrap_or(&self.name);
        SemanticVersion::try_parse_with_prefix(name, prefix, format)
    }
}

/// A tag together with the version parsed from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    pub tag: Tag,
    pub version: SemanticVersion,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn test_tag_version_with_v_prefix() {
        let tag = Tag::new("v1.2.3", CommitId::new("a"));
        assert_eq!(
            tag.version(&prefix("[vV]?"), SemanticVersionFormat::Strict),
            Some(SemanticVersion::new(1, 2, 3))
        );
    }

    #[test]
    fn test_tag_version_custom_prefix() {
        let tag = Tag::new("release-1.2.3", CommitId::new("a"));
        assert_eq!(
            tag.version(&prefix("release-"), SemanticVersionFormat::Strict),
            Some(SemanticVersion::new(1, 2, 3))
        );
        assert_eq!(
            tag.version(&prefix("[vV]?"), SemanticVersionFormat::Strict),
            None
        );
    }

    #[test]
    fn test_tag_version_full_ref_name() {
        let tag = Tag::new("refs/tags/2.0.0-beta.1", CommitId::new("a"));
        let version = tag
            .version(&prefix("[vV]?"), SemanticVersionFormat::Strict)
            .unwrap();
        assert_eq!(version.pre_release.label(), "beta");
    }

    #[test]
    fn test_unparsable_tag_is_skipped() {
        let tag = Tag::new("latest", CommitId::new("a"));
        assert_eq!(tag.version(&prefix("[vV]?"), SemanticVersionFormat::Loose), None);
    }
}
