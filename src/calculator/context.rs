//! Everything one calculation needs, resolved once
//!
//! The context borrows the graph and the resolver; all derived state
//! (caches, effective configuration, formatted label) is owned here and
//! dropped with the calculation.

use crate::calculator::increment::{self, MessageAnalyzer};
use crate::calculator::CalculationRequest;
use crate::config::{ConfigurationResolver, EffectiveBranchConfiguration, GlobalSettings};
use crate::domain::branch::{Branch, BranchType};
use crate::domain::commit::{Commit, CommitId};
use crate::domain::tag::VersionTag;
use crate::domain::version::{SemanticVersion, SemanticVersionFormat, VersionField};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::format::label::format_label;
use crate::git::{CommitGraph, RepositoryStore};
use std::cell::OnceCell;
use std::cmp::Reverse;

/// Where a branch forked off one of its source branches
#[derive(Debug, Clone)]
pub struct BranchPoint<'a> {
    /// The source branch
    pub branch: &'a Branch,
    pub config: &'a EffectiveBranchConfiguration,
    /// Merge base of the source branch and the forked branch
    pub commit: CommitId,
}

/// A live release branch carrying a version in its name
#[derive(Debug, Clone)]
pub struct ReleaseBranch<'a> {
    pub branch: &'a Branch,
    pub config: &'a EffectiveBranchConfiguration,
    pub version: SemanticVersion,
}

pub struct CalculationContext<'a> {
    pub store: RepositoryStore<'a>,
    pub resolver: &'a ConfigurationResolver,
    pub environment: &'a dyn Environment,
    /// Friendly name of the evaluated branch
    pub branch_name: String,
    pub head: &'a Commit,
    pub config: &'a EffectiveBranchConfiguration,
    /// Formatted pre-release label; empty means none
    pub label: String,
    reachable_tags: Vec<VersionTag>,
    branch_increment: OnceCell<VersionField>,
}

impl<'a> CalculationContext<'a> {
    /// Resolve the evaluated branch and commit
    ///
    /// # Errors
    /// [Error::NoCommitsFound] when the requested branch or commit is not
    /// part of the snapshot.
    pub fn new(
        graph: &'a dyn CommitGraph,
        resolver: &'a ConfigurationResolver,
        environment: &'a dyn Environment,
        request: &CalculationRequest,
    ) -> Result<Self> {
        let store = RepositoryStore::new(graph, &resolver.global().ignore);

        let requested = request
            .branch
            .clone()
            .or_else(|| graph.head_branch().map(str::to_string));

        let (branch_name, head_id) = match requested {
            Some(name) => {
                let tip = match (&request.commit, store.find_branch(&name)) {
                    (Some(commit), _) => commit.clone(),
                    (None, Some(branch)) => branch.tip.clone(),
                    (None, None) => match graph.head() {
                        // HEAD on a branch missing from the ref list
                        Some(head) if request.branch.is_none() => head.clone(),
                        _ => return Err(Error::no_commits(name)),
                    },
                };
                let friendly = store
                    .find_branch(&name)
                    .map(|b| b.friendly_name())
                    .unwrap_or(name);
                (friendly, tip)
            }
            None => {
                let head = request
                    .commit
                    .clone()
                    .or_else(|| graph.head().cloned())
                    .ok_or_else(|| Error::no_commits("HEAD"))?;
                (Self::detached_branch_name(&store, &head), head)
            }
        };

        let head = store
            .commit(&head_id)
            .ok_or_else(|| Error::no_commits(branch_name.clone()))?;
        let config = resolver.resolve(&branch_name);
        let label = format_label(
            &config.label,
            &config.regex,
            &branch_name,
            &config.branch_type,
            &head.id,
            environment,
        );

        let global = resolver.global();
        let reachable_tags = store.version_tags_reachable_from(
            &head.id,
            &global.tag_prefix,
            global.semantic_version_format,
        );

        tracing::debug!(
            branch = %branch_name,
            branch_type = %config.branch_type,
            head = %head.id.short(),
            label = %label,
            "calculation context"
        );

        Ok(CalculationContext {
            store,
            resolver,
            environment,
            branch_name,
            head,
            config,
            label,
            reachable_tags,
            branch_increment: OnceCell::new(),
        })
    }

    /// Name for a detached HEAD: a branch whose tip is HEAD, else one that
    /// contains it
    fn detached_branch_name(store: &RepositoryStore<'_>, head: &CommitId) -> String {
        let branches = store.branches();
        branches
            .iter()
            .find(|b| &b.tip == head)
            .or_else(|| branches.iter().find(|b| store.is_ancestor(head, &b.tip)))
            .map(|b| b.friendly_name())
            .unwrap_or_else(|| "HEAD".to_string())
    }

    pub fn global(&self) -> &'a GlobalSettings {
        self.resolver.global()
    }

    pub fn head_id(&self) -> &'a CommitId {
        &self.head.id
    }

    pub fn is_head(&self, id: &CommitId) -> bool {
        &self.head.id == id
    }

    pub fn analyzer(&self) -> MessageAnalyzer<'a> {
        MessageAnalyzer::new(self.global())
    }

    /// Version tags in the history of HEAD, highest first
    pub fn reachable_tags(&self) -> &[VersionTag] {
        &self.reachable_tags
    }

    /// Every version tag in the snapshot, highest first
    pub fn all_tags(&self) -> Vec<VersionTag> {
        let global = self.global();
        self.store
            .version_tags(&global.tag_prefix, global.semantic_version_format)
    }

    /// Increment of the evaluated branch with `Inherit` resolved
    pub fn branch_increment(&self) -> VersionField {
        *self.branch_increment.get_or_init(|| {
            increment::resolve_increment(self, self.config, &self.branch_name, self.head_id())
        })
    }

    /// Branch point of the evaluated branch
    pub fn branch_point(&self) -> Option<BranchPoint<'a>> {
        self.branch_point_of(&self.branch_name, self.head_id(), self.config)
    }

    /// Closest fork point of `name` from any branch of its source types
    ///
    /// The merge base with the most recent committer time wins, then the
    /// branch name. A source branch that already contains `tip` is skipped
    /// unless it points at `tip` itself (a branch just created from it).
    pub fn branch_point_of(
        &self,
        name: &str,
        tip: &CommitId,
        config: &EffectiveBranchConfiguration,
    ) -> Option<BranchPoint<'a>> {
        if config.source_branches.is_empty() {
            return None;
        }

        let mut best: Option<(BranchPoint<'a>, &'a Commit)> = None;
        for branch in self.store.branches() {
            let friendly = branch.friendly_name();
            if friendly == name {
                continue;
            }
            let source_config = self.resolver.resolve(&friendly);
            if !config.source_branches.contains(&source_config.branch_type) {
                continue;
            }
            let Some(base) = self.store.merge_base(tip, &branch.tip) else {
                continue;
            };
            if &base == tip && &branch.tip != tip {
                continue;
            }
            let Some(base_commit) = self.store.commit(&base) else {
                continue;
            };

            let better = match &best {
                None => true,
                Some((current, current_commit)) => {
                    (base_commit.committer_time, Reverse(&friendly))
                        > (
                            current_commit.committer_time,
                            Reverse(&current.branch.friendly_name()),
                        )
                }
            };
            if better {
                best = Some((
                    BranchPoint {
                        branch,
                        config: source_config,
                        commit: base,
                    },
                    base_commit,
                ));
            }
        }

        let point = best.map(|(point, _)| point);
        if let Some(point) = &point {
            tracing::trace!(
                branch = %name,
                source = %point.branch.name,
                commit = %point.commit.short(),
                "branch point"
            );
        }
        point
    }

    /// Version embedded in a branch name
    ///
    /// Uses the `BranchName` capture of the branch type's regex when present,
    /// else the whole name. Each `/`-separated segment is tried, loosely and
    /// with the tag prefix allowed.
    pub fn branch_version(
        &self,
        name: &str,
        config: &EffectiveBranchConfiguration,
    ) -> Option<SemanticVersion> {
        let captured = config
            .regex
            .captures(name)
            .and_then(|c| c.name("BranchName").map(|m| m.as_str().to_string()))
            .unwrap_or_else(|| name.to_string());

        let version = captured.split('/').find_map(|segment| {
            SemanticVersion::try_parse_with_prefix(
                segment,
                &self.global().tag_prefix,
                SemanticVersionFormat::Loose,
            )
        });
        if version.is_none() {
            tracing::trace!(branch = %name, "no version in branch name");
        }
        version
    }

    /// Live release branches with a version in their name
    ///
    /// Pull-request branches never qualify.
    pub fn release_branches(&self) -> Vec<ReleaseBranch<'a>> {
        self.store
            .branches()
            .into_iter()
            .filter_map(|branch| {
                let friendly = branch.friendly_name();
                let config = self.resolver.resolve(&friendly);
                if !config.is_release_branch || config.branch_type == BranchType::PullRequest {
                    return None;
                }
                let version = self.branch_version(&friendly, config)?;
                Some(ReleaseBranch {
                    branch,
                    config,
                    version,
                })
            })
            .collect()
    }

    /// Whether a tag's pre-release label lets it seed this branch
    pub fn accepts_tag_label(&self, version: &SemanticVersion) -> bool {
        let label = version.pre_release.label();
        label.is_empty() || label == self.label
    }
}
