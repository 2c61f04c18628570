//! Pre-release numbering and build metadata
//!
//! | Mode                   | Pre-release number            | Build metadata |
//! |------------------------|-------------------------------|----------------|
//! | `ManualDeployment`     | next free tag number          | commit count   |
//! | `ContinuousDelivery`   | commit count                  | none           |
//! | `ContinuousDeployment` | dropped                       | none           |

use crate::calculator::arbiter::EvaluatedCandidate;
use crate::calculator::CalculationContext;
use crate::config::DeploymentMode;
use crate::domain::prerelease::PreReleaseTag;
use crate::domain::tag::VersionTag;
use crate::domain::version::SemanticVersion;

/// The version reported for the winning candidate
///
/// A tag on HEAD that won without an increment is reported verbatim.
pub fn finalize(ctx: &CalculationContext<'_>, winner: &EvaluatedCandidate, commits: u64) -> SemanticVersion {
    if winner.is_exact_tag(ctx) {
        let mut version = winner.candidate.version.clone();
        version.build_metadata = None;
        return version;
    }

    let core = winner.effective.core();
    let label = ctx.label.as_str();

    match ctx.config.deployment_mode {
        DeploymentMode::ManualDeployment => {
            let mut version = if label.is_empty() {
                core
            } else {
                let number = next_tag_number(ctx.reachable_tags(), &winner.effective, label);
                core.with_pre_release(PreReleaseTag::new(label, Some(number)))
            };
            version.build_metadata = Some(commits);
            version
        }
        DeploymentMode::ContinuousDelivery => core.with_pre_release(PreReleaseTag::new(label, Some(commits))),
        DeploymentMode::ContinuousDeployment => core,
    }
}

/// One past the highest number of a tag with the same core and label
fn next_tag_number(tags: &[VersionTag], version: &SemanticVersion, label: &str) -> u64 {
    tags.iter()
        .filter(|t| t.version.same_core(version) && t.version.pre_release.has_label(label))
        .filter_map(|t| t.version.pre_release.number)
        .max()
        .map_or(1, |n| n.saturating_add(1))
}

/// Sortable number across releases and pre-releases
pub fn weighted_pre_release_number(ctx: &CalculationContext<'_>, version: &SemanticVersion) -> u64 {
    if version.pre_release.is_empty() {
        ctx.global().tag_pre_release_weight
    } else {
        ctx.config
            .pre_release_weight
            .saturating_add(version.pre_release.number.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commit::CommitId;
    use crate::domain::tag::Tag;
    use crate::domain::version::SemanticVersionFormat;

    fn tag(name: &str) -> VersionTag {
        VersionTag {
            tag: Tag::new(name, CommitId::new(name)),
            version: SemanticVersion::parse(name, SemanticVersionFormat::Strict).unwrap(),
        }
    }

    #[test]
    fn test_next_tag_number_without_tags() {
        assert_eq!(next_tag_number(&[], &SemanticVersion::new(1, 0, 0), "beta"), 1);
    }

    #[test]
    fn test_next_tag_number_follows_matching_tags() {
        let tags = vec![
            tag("1.0.0-beta.1"),
            tag("1.0.0-beta.3"),
            tag("1.0.0-alpha.9"),
            tag("0.9.0-beta.7"),
        ];
        assert_eq!(next_tag_number(&tags, &SemanticVersion::new(1, 0, 0), "beta"), 4);
        assert_eq!(next_tag_number(&tags, &SemanticVersion::new(1, 0, 0), "rc"), 1);
    }

    #[test]
    fn test_next_tag_number_at_limit_does_not_wrap() {
        let tags = vec![tag(&format!("1.0.0-beta.{}", u64::MAX))];
        assert_eq!(next_tag_number(&tags, &SemanticVersion::new(1, 0, 0), "beta"), u64::MAX);
    }
}
