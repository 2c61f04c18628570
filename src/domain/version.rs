use crate::domain::prerelease::PreReleaseTag;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// How strictly version strings are parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticVersionFormat {
    /// Full SemVer 2.0.0 grammar
    #[default]
    Strict,
    /// Accepts `1`, `1.2`, `1.2.3` and `1.2.3.4`
    Loose,
}

/// Version component to bump
///
/// Variants are declared in ascending severity so the derived ordering can be
/// used to pick the strongest of several increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VersionField {
    None,
    Patch,
    Minor,
    Major,
}

/// Semantic version with pre-release tag and commit-count build metadata
///
/// Equality follows precedence: build metadata is ignored.
#[derive(Debug, Clone, Default)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: PreReleaseTag,
    pub build_metadata: Option<u64>,
}

fn loose_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<major>\d+)(?:\.(?P<minor>\d+))?(?:\.(?P<patch>\d+))?(?:\.\d+)?(?:-(?P<pre>[^+]*))?(?:\+(?P<meta>.*))?$",
        )
        .expect("static loose version regex")
    })
}

impl SemanticVersion {
    /// Create a new released version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
            pre_release: PreReleaseTag::empty(),
            build_metadata: None,
        }
    }

    /// Same version carrying the given pre-release tag
    pub fn with_pre_release(mut self, pre_release: PreReleaseTag) -> Self {
        self.pre_release = pre_release;
        self
    }

    /// Parse a version string without any prefix
    pub fn parse(input: &str, format: SemanticVersionFormat) -> Result<Self> {
        match format {
            SemanticVersionFormat::Strict => Self::parse_strict(input),
            SemanticVersionFormat::Loose => Self::parse_loose(input),
        }
    }

    /// Parse a version after removing a leading match of `prefix`
    ///
    /// Returns `None` when the remainder is not a version; callers treat such
    /// tags as not versioned.
    pub fn try_parse_with_prefix(
        input: &str,
        prefix: &Regex,
        format: SemanticVersionFormat,
    ) -> Option<Self> {
        let remainder = match prefix.find(input) {
            Some(m) if m.start() == 0 => &input[m.end()..],
            _ => input,
        };
        Self::parse(remainder, format).ok()
    }

    fn parse_strict(input: &str) -> Result<Self> {
        let parsed = semver::Version::parse(input)
            .map_err(|e| Error::version(format!("Invalid version '{}': {}", input, e)))?;

        let build_metadata = if parsed.build.is_empty() {
            None
        } else {
            parsed.build.as_str().parse::<u64>().ok()
        };

        Ok(SemanticVersion {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre_release: PreReleaseTag::parse(parsed.pre.as_str()),
            build_metadata,
        })
    }

    fn parse_loose(input: &str) -> Result<Self> {
        let captures = loose_regex()
            .captures(input)
            .ok_or_else(|| Error::version(format!("Invalid version '{}'", input)))?;

        let component = |name: &str| -> Result<u64> {
            match captures.name(name) {
                Some(m) => m
                    .as_str()
                    .parse::<u64>()
                    .map_err(|_| Error::version(format!("Invalid {} version: {}", name, m.as_str()))),
                None => Ok(0),
            }
        };

        Ok(SemanticVersion {
            major: component("major")?,
            minor: component("minor")?,
            patch: component("patch")?,
            pre_release: captures
                .name("pre")
                .map(|m| PreReleaseTag::parse(m.as_str()))
                .unwrap_or_default(),
            build_metadata: captures.name("meta").and_then(|m| m.as_str().parse().ok()),
        })
    }

    /// `major.minor.patch` without pre-release or metadata
    pub fn major_minor_patch(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// Whether the numeric components match
    pub fn same_core(&self, other: &SemanticVersion) -> bool {
        self.major == other.major && self.minor == other.minor && self.patch == other.patch
    }

    /// The released version with the same numeric components
    pub fn core(&self) -> SemanticVersion {
        SemanticVersion::new(self.major, self.minor, self.patch)
    }

    /// Bump the version by `field`
    ///
    /// A pre-release carrying `label` only has its counter bumped. Any other
    /// pre-release is promoted to the release it precedes, bumping the
    /// requested component only when the promotion alone would not reach it.
    pub fn increment(&self, field: VersionField, label: Option<&str>) -> Self {
        if field == VersionField::None {
            return self.clone();
        }

        if !self.pre_release.is_empty() {
            if let Some(label) = label {
                if self.pre_release.has_label(label) {
                    let mut next = self.clone();
                    next.pre_release = self.pre_release.increment_number();
                    next.build_metadata = None;
                    return next;
                }
            }

            let promoted = self.core();
            return match field {
                VersionField::Major if promoted.minor == 0 && promoted.patch == 0 => promoted,
                VersionField::Minor if promoted.patch == 0 => promoted,
                VersionField::Patch => promoted,
                _ => promoted.increment(field, None),
            };
        }

        // A component already at u64::MAX cannot move; the version stays put
        let bumped = match field {
            VersionField::Major => self.major.checked_add(1).map(|major| SemanticVersion::new(major, 0, 0)),
            VersionField::Minor => self
                .minor
                .checked_add(1)
                .map(|minor| SemanticVersion::new(self.major, minor, 0)),
            VersionField::Patch => self
                .patch
                .checked_add(1)
                .map(|patch| SemanticVersion::new(self.major, self.minor, patch)),
            VersionField::None => None,
        };
        bumped.unwrap_or_else(|| self.clone())
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.pre_release.hash(state);
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    /// Build metadata does not take part in precedence.
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
            .then_with(|| self.pre_release.cmp(&other.pre_release))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre_release.is_empty() {
            write!(f, "-{}", self.pre_release)?;
        }
        if let Some(meta) = self.build_metadata {
            write!(f, "+{}", meta)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix() -> Regex {
        Regex::new("[vV]?").unwrap()
    }

    #[test]
    fn test_version_parse_strict() {
        let v = SemanticVersion::parse("1.2.3", SemanticVersionFormat::Strict).unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_version_parse_strict_with_pre_release() {
        let v = SemanticVersion::parse("2.0.0-beta.4", SemanticVersionFormat::Strict).unwrap();
        assert_eq!(v.pre_release.label(), "beta");
        assert_eq!(v.pre_release.number, Some(4));
    }

    #[test]
    fn test_version_parse_strict_rejects_partial() {
        assert!(SemanticVersion::parse("1.2", SemanticVersionFormat::Strict).is_err());
        assert!(SemanticVersion::parse("1.2.3.4", SemanticVersionFormat::Strict).is_err());
    }

    #[test]
    fn test_version_parse_loose_partial() {
        let v = SemanticVersion::parse("1.2", SemanticVersionFormat::Loose).unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 0));
        let v = SemanticVersion::parse("3", SemanticVersionFormat::Loose).unwrap();
        assert_eq!(v, SemanticVersion::new(3, 0, 0));
        let v = SemanticVersion::parse("1.2.3.4", SemanticVersionFormat::Loose).unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_version_parse_with_prefix() {
        let v = SemanticVersion::try_parse_with_prefix(
            "v1.2.3",
            &prefix(),
            SemanticVersionFormat::Strict,
        );
        assert_eq!(v, Some(SemanticVersion::new(1, 2, 3)));
        assert_eq!(
            SemanticVersion::try_parse_with_prefix(
                "release-1.2.3",
                &prefix(),
                SemanticVersionFormat::Strict
            ),
            None
        );
    }

    #[test]
    fn test_version_bump_release() {
        let v = SemanticVersion::new(1, 2, 3);
        assert_eq!(
            v.increment(VersionField::Major, None),
            SemanticVersion::new(2, 0, 0)
        );
        assert_eq!(
            v.increment(VersionField::Minor, None),
            SemanticVersion::new(1, 3, 0)
        );
        assert_eq!(
            v.increment(VersionField::Patch, None),
            SemanticVersion::new(1, 2, 4)
        );
        assert_eq!(v.increment(VersionField::None, None), v);
    }

    #[test]
    fn test_bump_matching_pre_release_bumps_counter() {
        let v = SemanticVersion::parse("1.0.0-beta.1", SemanticVersionFormat::Strict).unwrap();
        let next = v.increment(VersionField::Minor, Some("beta"));
        assert_eq!(next.to_string(), "1.0.0-beta.2");
    }

    #[test]
    fn test_bump_foreign_pre_release_promotes() {
        let v = SemanticVersion::parse("1.0.1-alpha.3", SemanticVersionFormat::Strict).unwrap();
        assert_eq!(
            v.increment(VersionField::Patch, Some("beta")),
            SemanticVersion::new(1, 0, 1)
        );
        assert_eq!(
            v.increment(VersionField::Minor, None),
            SemanticVersion::new(1, 1, 0)
        );
        let v = SemanticVersion::parse("1.1.0-alpha.3", SemanticVersionFormat::Strict).unwrap();
        assert_eq!(
            v.increment(VersionField::Minor, None),
            SemanticVersion::new(1, 1, 0)
        );
    }

    #[test]
    fn test_ordering_ignores_build_metadata() {
        let mut a = SemanticVersion::new(1, 0, 0);
        a.build_metadata = Some(5);
        assert_eq!(a.cmp(&SemanticVersion::new(1, 0, 0)), Ordering::Equal);
        let pre = SemanticVersion::new(1, 0, 0).with_pre_release(PreReleaseTag::parse("rc.1"));
        assert!(pre < SemanticVersion::new(1, 0, 0));
        assert!(pre > SemanticVersion::new(0, 9, 9));
    }

    #[test]
    fn test_equality_matches_ordering() {
        use std::collections::HashSet;

        let mut with_meta = SemanticVersion::new(1, 0, 0);
        with_meta.build_metadata = Some(5);
        assert_eq!(with_meta, SemanticVersion::new(1, 0, 0));

        let mut set = HashSet::new();
        set.insert(with_meta);
        assert!(set.contains(&SemanticVersion::new(1, 0, 0)));
    }

    #[test]
    fn test_bump_at_limit_keeps_version() {
        let max = SemanticVersion::new(u64::MAX, 4, 2);
        assert_eq!(max.increment(VersionField::Major, None), max);
        assert_eq!(
            max.increment(VersionField::Minor, None),
            SemanticVersion::new(u64::MAX, 5, 0)
        );
        let top = SemanticVersion::new(1, 2, u64::MAX);
        assert_eq!(top.increment(VersionField::Patch, None), top);
    }

    #[test]
    fn test_version_field_ordering() {
        assert!(VersionField::Major > VersionField::Minor);
        assert!(VersionField::Minor > VersionField::Patch);
        assert!(VersionField::Patch > VersionField::None);
    }

    #[test]
    fn test_version_display() {
        let mut v = SemanticVersion::new(1, 2, 3).with_pre_release(PreReleaseTag::new("foo", Some(1)));
        v.build_metadata = Some(0);
        assert_eq!(v.to_string(), "1.2.3-foo.1+0");
    }
}
