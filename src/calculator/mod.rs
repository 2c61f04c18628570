//! Version calculation pipeline
//!
//! One calculation runs, in order: context resolution, candidate
//! collection from every enabled strategy, evaluation and arbitration,
//! commit counting, numbering by deployment mode, and the projection into
//! [VersionVariables].
//!
//! # Example
//!
//! ```rust
//! # use branchver::calculator::{CalculationRequest, VersionCalculator};
//! # use branchver::config::{Config, Workflow};
//! # use branchver::git::RepositoryFixture;
//! let mut fixture = RepositoryFixture::new();
//! fixture.commit("initial");
//! fixture.tag("1.0.0");
//! fixture.commit("fix");
//! let graph = fixture.snapshot();
//!
//! let calculator = VersionCalculator::new(&Config::for_workflow(Workflow::GitHubFlow)).unwrap();
//! let variables = calculator.calculate(&graph, &CalculationRequest::head()).unwrap();
//! assert_eq!(variables.full_sem_ver, "1.0.1-1");
//! ```

pub mod arbiter;
pub mod context;
pub mod counter;
pub mod increment;

pub use context::CalculationContext;

use crate::config::{Config, ConfigurationResolver};
use crate::domain::commit::CommitId;
use crate::environment::{Environment, ProcessEnvironment};
use crate::error::Result;
use crate::format::numbering;
use crate::format::variables::{Projection, VersionVariables};
use crate::git::CommitGraph;
use crate::strategies::{self, BaseVersionCandidate};
use std::sync::Arc;

/// What to calculate a version for
///
/// Without a branch the branch HEAD is on is used; without a commit the
/// branch tip (or HEAD) is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationRequest {
    pub branch: Option<String>,
    pub commit: Option<CommitId>,
}

impl CalculationRequest {
    /// The current HEAD
    pub fn head() -> Self {
        CalculationRequest::default()
    }

    pub fn for_branch(name: impl Into<String>) -> Self {
        CalculationRequest {
            branch: Some(name.into()),
            commit: None,
        }
    }

    pub fn at_commit(mut self, commit: CommitId) -> Self {
        self.commit = Some(commit);
        self
    }
}

/// Validated configuration plus the environment for label placeholders
///
/// Holds no per-calculation state; one calculator can serve several threads.
#[derive(Clone)]
pub struct VersionCalculator {
    resolver: ConfigurationResolver,
    environment: Arc<dyn Environment>,
}

impl VersionCalculator {
    /// Validate a configuration
    ///
    /// # Errors
    /// Any configuration error reported by [ConfigurationResolver::new].
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::from_resolver(ConfigurationResolver::new(config)?))
    }

    pub fn from_resolver(resolver: ConfigurationResolver) -> Self {
        VersionCalculator {
            resolver,
            environment: Arc::new(ProcessEnvironment),
        }
    }

    /// Read `{env:..}` placeholders from `environment` instead of the process
    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    pub fn resolver(&self) -> &ConfigurationResolver {
        &self.resolver
    }

    /// Calculate the version variables for a position in `graph`
    ///
    /// # Errors
    /// [crate::Error::NoCommitsFound] when the requested branch or commit is
    /// not in the snapshot.
    #[tracing::instrument(skip_all, fields(branch = ?request.branch))]
    pub fn calculate(&self, graph: &dyn CommitGraph, request: &CalculationRequest) -> Result<VersionVariables> {
        let ctx = CalculationContext::new(graph, &self.resolver, self.environment.as_ref(), request)?;

        let evaluated = arbiter::evaluate(&ctx, collect_candidates(&ctx));
        let winner = arbiter::select(&ctx, evaluated)?;

        let source = winner.candidate.source.as_ref();
        let commits = counter::commits_since(&ctx, source);
        let version = numbering::finalize(&ctx, &winner, commits);
        let version_source = counter::version_source_sha(&ctx, source);
        let global = ctx.global();

        tracing::debug!(version = %version, commits, "calculated version");

        Ok(VersionVariables::project(&Projection {
            version: &version,
            branch_name: &ctx.branch_name,
            head: ctx.head,
            version_source: version_source.as_ref(),
            commits_since_version_source: commits,
            weighted_pre_release_number: numbering::weighted_pre_release_number(&ctx, &version),
            commit_date_format: &global.commit_date_format,
            assembly_versioning_scheme: global.assembly_versioning_scheme,
            assembly_file_versioning_scheme: global.assembly_file_versioning_scheme,
        }))
    }
}

/// Calculate with a one-off calculator reading the process environment
pub fn calculate(graph: &dyn CommitGraph, config: &Config, request: &CalculationRequest) -> Result<VersionVariables> {
    VersionCalculator::new(config)?.calculate(graph, request)
}

fn collect_candidates(ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
    strategies::enabled(&ctx.config.strategies)
        .into_iter()
        .flat_map(|strategy| {
            let candidates = strategy.candidates(ctx);
            tracing::trace!(strategy = %strategy.kind(), count = candidates.len(), "candidates");
            candidates
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::strategies::StrategyKind;
    use std::collections::BTreeMap;

    /// Run `f` against a context for `branch` with an empty environment
    pub fn with_context<R>(
        graph: &dyn CommitGraph,
        config: Config,
        branch: &str,
        f: impl FnOnce(&CalculationContext<'_>) -> R,
    ) -> R {
        let resolver = ConfigurationResolver::new(&config).expect("valid configuration");
        let environment: BTreeMap<String, String> = BTreeMap::new();
        let request = CalculationRequest::for_branch(branch);
        let ctx = CalculationContext::new(graph, &resolver, &environment, &request).expect("branch exists");
        f(&ctx)
    }

    pub fn run_strategy(
        kind: StrategyKind,
        graph: &dyn CommitGraph,
        config: Config,
        branch: &str,
    ) -> Vec<BaseVersionCandidate> {
        with_context(graph, config, branch, |ctx| kind.strategy().candidates(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BranchConfig, DeploymentMode, Workflow};
    use crate::error::Error;
    use crate::git::RepositoryFixture;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn github_flow() -> VersionCalculator {
        VersionCalculator::new(&Config::for_workflow(Workflow::GitHubFlow)).unwrap()
    }

    #[test]
    fn test_first_commit_on_main() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        let graph = fixture.snapshot();

        let vars = github_flow().calculate(&graph, &CalculationRequest::head()).unwrap();
        assert_eq!(vars.full_sem_ver, "0.0.1-1");
        assert_eq!(vars.commits_since_version_source, 1);
    }

    #[test]
    fn test_exact_tag_is_used_verbatim() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.tag("v1.4.0");
        let graph = fixture.snapshot();

        let vars = github_flow().calculate(&graph, &CalculationRequest::head()).unwrap();
        assert_eq!(vars.full_sem_ver, "1.4.0");
        assert_eq!(vars.commits_since_version_source, 0);
        assert_eq!(vars.build_meta_data, None);
    }

    #[test]
    fn test_bump_past_largest_major_does_not_panic() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.tag("18446744073709551615.0.0");
        fixture.commit("breaking\n\n+semver: major");
        let graph = fixture.snapshot();

        let vars = github_flow().calculate(&graph, &CalculationRequest::head()).unwrap();
        assert_eq!(vars.full_sem_ver, "18446744073709551615.0.0-1");
        assert_eq!(vars.major, u64::MAX);
    }

    #[test]
    fn test_missing_branch_is_reported() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        let graph = fixture.snapshot();

        let err = github_flow()
            .calculate(&graph, &CalculationRequest::for_branch("feature/nope"))
            .unwrap_err();
        assert!(matches!(err, Error::NoCommitsFound { branch } if branch == "feature/nope"));
    }

    #[test]
    fn test_empty_repository_is_reported() {
        let graph = RepositoryFixture::new().snapshot();
        let err = github_flow().calculate(&graph, &CalculationRequest::head()).unwrap_err();
        assert!(matches!(err, Error::NoCommitsFound { .. }));
    }

    #[test]
    fn test_environment_feeds_label() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.branch("feature/login");
        let graph = fixture.snapshot();

        let config = Config::for_workflow(Workflow::GitHubFlow).with_branch(
            "feature",
            BranchConfig {
                label: Some("{env:BUILD_LABEL ?? 'local'}".to_string()),
                deployment_mode: Some(DeploymentMode::ContinuousDelivery),
                ..BranchConfig::default()
            },
        );
        let mut env = HashMap::new();
        env.insert("BUILD_LABEL".to_string(), "ci".to_string());

        let with_env = VersionCalculator::new(&config).unwrap().with_environment(env);
        let vars = with_env.calculate(&graph, &CalculationRequest::head()).unwrap();
        assert_eq!(vars.pre_release_label, "ci");

        let without = VersionCalculator::new(&config)
            .unwrap()
            .with_environment(HashMap::<String, String>::new());
        let vars = without.calculate(&graph, &CalculationRequest::head()).unwrap();
        assert_eq!(vars.pre_release_label, "local");
    }

    #[test]
    fn test_calculation_at_older_commit() {
        let mut fixture = RepositoryFixture::new();
        let first = fixture.commit("initial");
        fixture.commit("second");
        fixture.commit("third");
        let graph = fixture.snapshot();

        let request = CalculationRequest::for_branch("main").at_commit(first.clone());
        let vars = github_flow().calculate(&graph, &request).unwrap();
        assert_eq!(vars.sha, first.as_str());
        assert_eq!(vars.commits_since_version_source, 1);
    }
}
