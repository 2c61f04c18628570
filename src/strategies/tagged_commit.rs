use super::{BaseVersionCandidate, StrategyKind, VersionStrategy};
use crate::calculator::CalculationContext;
use crate::domain::commit::CommitId;
use std::collections::HashSet;

/// Versions of tags in the history of HEAD
///
/// Only tags without a pre-release label or with the branch's own label
/// qualify. A qualifying tag on HEAD is used verbatim when
/// `prevent_increment_when_current_commit_tagged` is set.
///
/// With `track_merge_target`, a tag on a merge commit outside our history
/// also counts when the merge brought in one of our commits; counting then
/// starts at that commit.
pub struct TaggedCommitStrategy;

impl VersionStrategy for TaggedCommitStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TaggedCommit
    }

    fn candidates(&self, ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
        let mut candidates = Vec::new();

        // Tags are sorted highest first; keep the best one per commit
        let mut seen: HashSet<&CommitId> = HashSet::new();
        for tagged in ctx.reachable_tags() {
            if !ctx.accepts_tag_label(&tagged.version) || !seen.insert(&tagged.tag.target) {
                continue;
            }
            let exact = ctx.is_head(&tagged.tag.target)
                && ctx.config.prevent_increment_when_current_commit_tagged;
            candidates.push(BaseVersionCandidate::new(
                StrategyKind::TaggedCommit,
                tagged.version.clone(),
                Some(tagged.tag.target.clone()),
                !exact,
                format!("Git tag '{}'", tagged.tag.name),
            ));
        }

        if ctx.config.track_merge_target {
            candidates.extend(merge_target_candidates(ctx));
        }

        candidates
    }
}

fn merge_target_candidates(ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
    let history = ctx.store.ancestor_set(ctx.head_id());
    let mut candidates = Vec::new();

    for tagged in ctx.all_tags() {
        if history.contains(&tagged.tag.target) || !ctx.accepts_tag_label(&tagged.version) {
            continue;
        }
        let Some(merge) = ctx.store.commit(&tagged.tag.target) else {
            continue;
        };
        let merged_parent = merge
            .parents
            .iter()
            .skip(1)
            .find(|p| history.contains(*p) && ctx.store.is_visible(p));
        if let Some(parent) = merged_parent {
            candidates.push(BaseVersionCandidate::new(
                StrategyKind::TaggedCommit,
                tagged.version.clone(),
                Some(parent.clone()),
                true,
                format!("Git tag '{}' on merge target", tagged.tag.name),
            ));
        }
    }

    candidates
}
