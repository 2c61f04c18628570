use crate::calculator::CalculationContext;
use crate::domain::commit::CommitId;

/// Non-ignored commits in the history of HEAD but not of `source`
pub fn commits_since(ctx: &CalculationContext<'_>, source: Option<&CommitId>) -> u64 {
    ctx.store.count_since(source, ctx.head_id())
}

/// Commit the version is counted from
///
/// Without a source this is the oldest non-ignored commit reachable from
/// HEAD; `None` when every commit is ignored.
pub fn version_source_sha(ctx: &CalculationContext<'_>, source: Option<&CommitId>) -> Option<CommitId> {
    match source {
        Some(source) => Some(source.clone()),
        None => ctx
            .store
            .commits_since(None, ctx.head_id())
            .last()
            .map(|c| c.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::testing::with_context;
    use crate::config::{Config, IgnoreConfig};
    use crate::git::RepositoryFixture;

    #[test]
    fn test_diamond_counts_once() {
        let mut fixture = RepositoryFixture::new();
        let root = fixture.commit("initial");
        fixture.branch("feature/a");
        fixture.commit("a");
        fixture.checkout("main");
        fixture.commit("b");
        fixture.merge_no_ff("feature/a");
        let graph = fixture.snapshot();

        with_context(&graph, Config::default(), "main", |ctx| {
            assert_eq!(commits_since(ctx, Some(&root)), 3);
            assert_eq!(commits_since(ctx, None), 4);
        });
    }

    #[test]
    fn test_source_sha_defaults_to_oldest_visible_commit() {
        let mut fixture = RepositoryFixture::new();
        let root = fixture.commit("initial");
        let second = fixture.commit("second");
        fixture.commit("third");
        let graph = fixture.snapshot();

        with_context(&graph, Config::default(), "main", |ctx| {
            assert_eq!(version_source_sha(ctx, None), Some(root.clone()));
            assert_eq!(version_source_sha(ctx, Some(&second)), Some(second.clone()));
        });

        let ignoring_root = Config {
            ignore: IgnoreConfig {
                shas: vec![root.as_str().to_string()],
                ..IgnoreConfig::default()
            },
            ..Config::default()
        };
        with_context(&graph, ignoring_root, "main", |ctx| {
            assert_eq!(version_source_sha(ctx, None), Some(second.clone()));
            assert_eq!(commits_since(ctx, None), 2);
        });
    }
}
