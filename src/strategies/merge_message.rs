use super::{BaseVersionCandidate, StrategyKind, VersionStrategy};
use crate::calculator::CalculationContext;
use crate::domain::branch::BranchType;
use crate::domain::commit::{Commit, CommitId};
use crate::domain::version::SemanticVersion;

/// Versions of release branches merged into HEAD's history
///
/// The merged branch is read from the merge message. When the message names
/// no branch, live release branches containing the merged commit are used
/// instead.
///
/// Counting starts at the merged commit, the same point
/// [`TrackReleaseBranchesStrategy`](super::track_release::TrackReleaseBranchesStrategy)
/// uses while the release branch is alive, so deleting a merged release
/// branch leaves the version unchanged.
pub struct MergeMessageStrategy;

impl VersionStrategy for MergeMessageStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MergeMessage
    }

    fn candidates(&self, ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
        if !ctx.config.track_merge_message {
            return Vec::new();
        }

        ctx.store
            .commits_since(None, ctx.head_id())
            .into_iter()
            .filter(|c| c.is_merge())
            .filter_map(|merge| {
                let (version, merged, merged_parent) = merged_version(ctx, merge)?;
                Some(BaseVersionCandidate::new(
                    StrategyKind::MergeMessage,
                    version,
                    Some(merged_parent.clone()),
                    !ctx.config.prevent_increment_of_merged_branch,
                    format!("Merge message '{}' ({})", merge.subject(), merged),
                ))
            })
            .collect()
    }
}

/// Version and name of the release branch a merge brought in, with the
/// merged parent it arrived through
fn merged_version<'c>(
    ctx: &CalculationContext<'_>,
    merge: &'c Commit,
) -> Option<(SemanticVersion, String, &'c CommitId)> {
    let merged_parents = &merge.parents[1..];
    match ctx.global().merge_message_formats.parse(&merge.message) {
        Some(parsed) => {
            let config = ctx.resolver.resolve(&parsed.merged_branch);
            if !config.is_release_branch || config.branch_type == BranchType::PullRequest {
                return None;
            }
            let version = ctx.branch_version(&parsed.merged_branch, config)?;
            Some((version, parsed.merged_branch, merged_parents.first()?))
        }
        None => ctx
            .release_branches()
            .into_iter()
            .filter_map(|release| {
                merged_parents
                    .iter()
                    .find(|p| ctx.store.is_ancestor(p, &release.branch.tip))
                    .map(|parent| (release, parent))
            })
            .max_by(|(a, _), (b, _)| a.version.cmp(&b.version))
            .map(|(release, parent)| (release.version, release.branch.friendly_name(), parent)),
    }
}
