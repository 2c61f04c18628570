use super::{BaseVersionCandidate, StrategyKind, VersionStrategy};
use crate::calculator::CalculationContext;

/// Keeps a long-lived branch (develop) ahead of work in flight elsewhere
///
/// Every live release branch contributes its version, counted from where
/// it forked off HEAD's history. Release tags on main branches that HEAD
/// has not merged yet contribute too.
pub struct TrackReleaseBranchesStrategy;

impl VersionStrategy for TrackReleaseBranchesStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TrackReleaseBranches
    }

    fn candidates(&self, ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
        if !ctx.config.tracks_release_branches {
            return Vec::new();
        }

        let head = ctx.head_id();
        let mut candidates: Vec<BaseVersionCandidate> = ctx
            .release_branches()
            .into_iter()
            .filter(|release| release.branch.friendly_name() != ctx.branch_name)
            .map(|release| {
                let source = ctx.store.merge_base(&release.branch.tip, head);
                BaseVersionCandidate::new(
                    StrategyKind::TrackReleaseBranches,
                    release.version,
                    source,
                    true,
                    format!("Release branch '{}'", release.branch.name),
                )
            })
            .collect();

        let main_tips: Vec<_> = ctx
            .store
            .branches()
            .into_iter()
            .filter(|b| ctx.resolver.resolve(&b.friendly_name()).is_main_branch)
            .map(|b| &b.tip)
            .collect();
        let history = ctx.store.ancestor_set(head);

        for tagged in ctx.all_tags() {
            let target = &tagged.tag.target;
            if history.contains(target) || !ctx.accepts_tag_label(&tagged.version) {
                continue;
            }
            if main_tips.iter().any(|tip| ctx.store.is_ancestor(target, tip)) {
                candidates.push(BaseVersionCandidate::new(
                    StrategyKind::TrackReleaseBranches,
                    tagged.version.clone(),
                    Some(target.clone()),
                    true,
                    format!("Git tag '{}' on main branch", tagged.tag.name),
                ));
            }
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::testing::run_strategy;
    use crate::config::Config;
    use crate::domain::version::SemanticVersion;
    use crate::git::RepositoryFixture;

    #[test]
    fn test_develop_tracks_live_release_branch() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.branch("develop");
        let fork = fixture.commit("dev work");
        fixture.branch("release/1.0.0");
        fixture.commit("stabilise");
        fixture.checkout("develop");
        fixture.commit("next feature");
        let graph = fixture.snapshot();

        let candidates = run_strategy(StrategyKind::TrackReleaseBranches, &graph, Config::default(), "develop");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].version, SemanticVersion::new(1, 0, 0));
        assert_eq!(candidates[0].source, Some(fork));
        assert!(candidates[0].should_increment);
    }

    #[test]
    fn test_develop_sees_unmerged_main_tags() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.branch("develop");
        fixture.commit("dev work");
        fixture.checkout("main");
        let hotfix = fixture.commit("hotfix on main");
        fixture.tag("1.0.1");
        fixture.checkout("develop");
        let graph = fixture.snapshot();

        let candidates = run_strategy(StrategyKind::TrackReleaseBranches, &graph, Config::default(), "develop");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].version, SemanticVersion::new(1, 0, 1));
        assert_eq!(candidates[0].source, Some(hotfix));
    }

    #[test]
    fn test_main_does_not_track() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.branch("release/1.0.0");
        fixture.commit("stabilise");
        fixture.checkout("main");
        let graph = fixture.snapshot();

        assert!(run_strategy(StrategyKind::TrackReleaseBranches, &graph, Config::default(), "main").is_empty());
    }
}
