use super::{BaseVersionCandidate, StrategyKind, VersionStrategy};
use crate::calculator::increment::{combine, field_of};
use crate::calculator::CalculationContext;
use crate::config::EffectiveBranchConfiguration;
use crate::domain::branch::BranchType;
use crate::domain::commit::{Commit, CommitId};
use crate::domain::tag::VersionTag;
use crate::domain::version::{SemanticVersion, VersionField};
use std::iter;

/// Treats every change reaching a main branch as a release
///
/// The first-parent chain of the main branch is walked from its latest
/// release tag. Each merged branch folds in one increment (its own,
/// raised by directives in the merged commits); each direct commit folds
/// in the main branch's increment.
pub struct MainlineStrategy;

impl VersionStrategy for MainlineStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Mainline
    }

    fn candidates(&self, ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
        if ctx.config.is_main_branch {
            let (version, source) = mainline_version(ctx, ctx.config, ctx.head_id());
            let should_increment = source.as_ref().map_or(true, |s| !ctx.is_head(s));
            return vec![BaseVersionCandidate::new(
                StrategyKind::Mainline,
                version,
                source,
                should_increment,
                format!("Mainline version of '{}'", ctx.branch_name),
            )];
        }

        match main_fork_point(ctx) {
            Some((config, fork)) => {
                let (version, _) = mainline_version(ctx, config, &fork);
                vec![BaseVersionCandidate::new(
                    StrategyKind::Mainline,
                    version,
                    Some(fork.clone()),
                    !ctx.is_head(&fork),
                    "Mainline version at branch point",
                )]
            }
            None => Vec::new(),
        }
    }
}

/// Highest release (no pre-release) tag in the history of `tip`
pub(crate) fn latest_release_tag(ctx: &CalculationContext<'_>, tip: &CommitId) -> Option<VersionTag> {
    let global = ctx.global();
    ctx.store
        .version_tags_reachable_from(tip, &global.tag_prefix, global.semantic_version_format)
        .into_iter()
        .find(|t| t.version.pre_release.is_empty())
}

/// Main branch configuration and the commit HEAD forked from it
pub(crate) fn main_fork_point<'a>(
    ctx: &CalculationContext<'a>,
) -> Option<(&'a EffectiveBranchConfiguration, CommitId)> {
    if let Some(point) = ctx.branch_point() {
        if point.config.is_main_branch {
            return Some((point.config, point.commit));
        }
    }

    ctx.store.branches().into_iter().find_map(|branch| {
        let config = ctx.resolver.resolve(&branch.friendly_name());
        if !config.is_main_branch {
            return None;
        }
        ctx.store
            .merge_base(ctx.head_id(), &branch.tip)
            .map(|base| (config, base))
    })
}

/// Configured increment of the branch a merge parent came from
///
/// `Inherit` and unresolvable branches take `main_default`.
pub(crate) fn merged_branch_increment(
    ctx: &CalculationContext<'_>,
    merge: &Commit,
    parent: &CommitId,
    main_default: VersionField,
) -> VersionField {
    let config = match ctx.global().merge_message_formats.parse(&merge.message) {
        Some(parsed) => Some(ctx.resolver.resolve(&parsed.merged_branch)),
        None => ctx
            .store
            .branches_containing(parent)
            .into_iter()
            .map(|b| ctx.resolver.resolve(&b.friendly_name()))
            .find(|c| !c.is_main_branch)
            .or_else(|| ctx.resolver.for_type(&BranchType::Unknown)),
    };
    config
        .and_then(|c| field_of(c.increment))
        .unwrap_or(main_default)
}

/// Fold the first-parent history of `tip` into a version
///
/// Returns the version and the last commit that changed it (the tag
/// commit, or `None`, when nothing did).
pub(crate) fn mainline_version(
    ctx: &CalculationContext<'_>,
    main_config: &EffectiveBranchConfiguration,
    tip: &CommitId,
) -> (SemanticVersion, Option<CommitId>) {
    let tag = latest_release_tag(ctx, tip);
    let tag_commit = tag.as_ref().map(|t| t.tag.target.clone());
    let mut version = tag
        .map(|t| t.version.core())
        .unwrap_or_else(|| SemanticVersion::new(0, 0, 0));
    let mut source = tag_commit.clone();

    let default = field_of(main_config.increment).unwrap_or(VersionField::Patch);
    let analyzer = ctx.analyzer();
    let chain = ctx.store.first_parent_since(tag_commit.as_ref(), tip);

    for commit in chain.into_iter().rev() {
        let folds: Vec<VersionField> = if commit.is_merge() {
            let own = analyzer.analyze_commits(iter::once(commit));
            commit.parents[1..]
                .iter()
                .map(|parent| {
                    let merged = ctx.store.commits_since(commit.first_parent(), parent);
                    let directive = analyzer.analyze_commits(merged).max(own);
                    combine(merged_branch_increment(ctx, commit, parent, default), directive)
                })
                .collect()
        } else {
            vec![combine(default, analyzer.analyze_commits(iter::once(commit)))]
        };

        for field in folds {
            if field != VersionField::None {
                version = version.increment(field, None);
                source = Some(commit.id.clone());
            }
        }
    }

    tracing::debug!(tip = %tip.short(), version = %version, "mainline version");
    (version, source)
}
