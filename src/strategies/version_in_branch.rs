use super::{BaseVersionCandidate, StrategyKind, VersionStrategy};
use crate::calculator::CalculationContext;
use crate::domain::version::VersionField;

/// Version embedded in the name of a release branch (`release/2.0.0`)
///
/// Counting starts at the branch point. The version is used as is unless a
/// commit since the branch point asks for a bump.
pub struct VersionInBranchNameStrategy;

impl VersionStrategy for VersionInBranchNameStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::VersionInBranchName
    }

    fn candidates(&self, ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
        if !ctx.config.is_release_branch {
            return Vec::new();
        }
        let Some(version) = ctx.branch_version(&ctx.branch_name, ctx.config) else {
            return Vec::new();
        };

        let source = ctx.branch_point().map(|point| point.commit);
        let bumped = ctx
            .analyzer()
            .analyze_commits(ctx.store.commits_since(source.as_ref(), ctx.head_id()))
            .is_some_and(|field| field > VersionField::None);

        vec![BaseVersionCandidate::new(
            StrategyKind::VersionInBranchName,
            version,
            source,
            bumped,
            format!("Version in branch name '{}'", ctx.branch_name),
        )]
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
    fn test_release_branch_version() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.tag("1.0.0");
        let fork = fixture.commit("more");
        fixture.branch("release/2.0.0");
        fixture.commit("stabilise");
        let graph = fixture.snapshot();

        let candidates = run_strategy(
            StrategyKind::VersionInBranchName,
            &graph,
            Config::default(),
            "release/2.0.0",
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].version, SemanticVersion::new(2, 0, 0));
        assert_eq!(candidates[0].source, Some(fork));
        assert!(!candidates[0].should_increment);
    }

    #[test]
    fn test_directive_since_branch_point_enables_increment() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.branch("release-v3.1");
        fixture.commit("breaking\n\n+semver: major");
        let graph = fixture.snapshot();

        let candidates = run_strategy(
            StrategyKind::VersionInBranchName,
            &graph,
            Config::default(),
            "release-v3.1",
        );
        assert_eq!(candidates[0].version, SemanticVersion::new(3, 1, 0));
        assert!(candidates[0].should_increment);
    }

    #[test]
    fn test_non_release_branches_are_ignored() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.branch("feature/2.0.0");
        let graph = fixture.snapshot();

        assert!(run_strategy(
            StrategyKind::VersionInBranchName,
            &graph,
            Config::default(),
            "feature/2.0.0",
        )
        .is_empty());
    }

    #[test]
    fn test_release_branch_without_version() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.branch("release/next");
        let graph = fixture.snapshot();

        assert!(run_strategy(
            StrategyKind::VersionInBranchName,
            &graph,
            Config::default(),
            "release/next",
        )
        .is_empty());
    }
}
