use super::mainline::{latest_release_tag, main_fork_point, merged_branch_increment};
use super::{BaseVersionCandidate, StrategyKind, VersionStrategy};
use crate::calculator::increment::field_of;
use crate::calculator::CalculationContext;
use crate::config::EffectiveBranchConfiguration;
use crate::domain::commit::CommitId;
use crate::domain::version::{SemanticVersion, VersionField};
use std::iter;

/// Every commit on the trunk is its own release
///
/// Unlike [super::mainline::MainlineStrategy], a commit's own directive
/// replaces the branch increment instead of raising it, and the resulting
/// version belongs to HEAD itself.
pub struct TrunkBasedStrategy;

impl VersionStrategy for TrunkBasedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TrunkBased
    }

    fn candidates(&self, ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
        if ctx.config.is_main_branch {
            let version = trunk_version(ctx, ctx.config, ctx.head_id());
            return vec![BaseVersionCandidate::new(
                StrategyKind::TrunkBased,
                version,
                Some(ctx.head_id().clone()),
                false,
                format!("Trunk version of '{}'", ctx.branch_name),
            )];
        }

        match main_fork_point(ctx) {
            Some((config, fork)) => vec![BaseVersionCandidate::new(
                StrategyKind::TrunkBased,
                trunk_version(ctx, config, &fork),
                Some(fork),
                true,
                "Trunk version at branch point",
            )],
            None => Vec::new(),
        }
    }
}

fn trunk_version(
    ctx: &CalculationContext<'_>,
    main_config: &EffectiveBranchConfiguration,
    tip: &CommitId,
) -> SemanticVersion {
    let tag = latest_release_tag(ctx, tip);
    let tag_commit = tag.as_ref().map(|t| t.tag.target.clone());
    let mut version = tag
        .map(|t| t.version.core())
        .unwrap_or_else(|| SemanticVersion::new(0, 0, 0));

    let default = field_of(main_config.increment).unwrap_or(VersionField::Patch);
    let analyzer = ctx.analyzer();

    for commit in ctx.store.first_parent_since(tag_commit.as_ref(), tip).into_iter().rev() {
        let field = match analyzer.analyze_commits(iter::once(commit)) {
            Some(directive) => directive,
            None if commit.is_merge() => commit.parents[1..]
                .iter()
                .map(|parent| merged_branch_increment(ctx, commit, parent, default))
                .max()
                .unwrap_or(default),
            None => default,
        };
        if field != VersionField::None {
            version = version.increment(field, None);
        }
    }

    tracing::debug!(tip = %tip.short(), version = %version, "trunk version");
    version
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::testing::run_strategy;
    use crate::config::{Config, Workflow};
    use crate::git::RepositoryFixture;

    fn trunk() -> Config {
        Config::for_workflow(Workflow::TrunkBased)
    }

    #[test]
    fn test_every_commit_is_a_release() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.tag("1.0.0");
        fixture.commit("one");
        let head = fixture.commit("two");
        let graph = fixture.snapshot();

        let candidates = run_strategy(StrategyKind::TrunkBased, &graph, trunk(), "main");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].version, SemanticVersion::new(1, 0, 2));
        assert_eq!(candidates[0].source, Some(head));
        assert!(!candidates[0].should_increment);
    }

    #[test]
    fn test_own_directive_replaces_default() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.tag("1.2.3");
        fixture.commit("breaking +semver: major");
        fixture.commit("docs +semver: none");
        let graph = fixture.snapshot();

        let candidates = run_strategy(StrategyKind::TrunkBased, &graph, trunk(), "main");
        assert_eq!(candidates[0].version, SemanticVersion::new(2, 0, 0));
    }

    #[test]
    fn test_feature_branch_starts_from_trunk_version() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.tag("1.0.0");
        let fork = fixture.commit("on trunk");
        fixture.branch("feature/x");
        fixture.commit("x");
        let graph = fixture.snapshot();

        let candidates = run_strategy(StrategyKind::TrunkBased, &graph, trunk(), "feature/x");
        assert_eq!(candidates[0].version, SemanticVersion::new(1, 0, 1));
        assert_eq!(candidates[0].source, Some(fork));
        assert!(candidates[0].should_increment);
    }
}
