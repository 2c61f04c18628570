//! Per-calculation view of a commit graph
//!
//! The store applies the ignore filter and memoises the expensive graph
//! queries. It is owned by a single calculation; the caches use `RefCell`
//! and are never shared between threads.

use crate::domain::branch::Branch;
use crate::domain::commit::{Commit, CommitId};
use crate::domain::ignore::IgnoreFilter;
use crate::domain::tag::VersionTag;
use crate::domain::version::SemanticVersionFormat;
use crate::git::{lowest_common_ancestor, CommitGraph};
use regex::Regex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Ids of every commit reachable from some commit (itself included)
pub type AncestorSet = Rc<HashSet<CommitId>>;

pub struct RepositoryStore<'a> {
    graph: &'a dyn CommitGraph,
    ignore: &'a IgnoreFilter,
    ancestors: RefCell<HashMap<CommitId, AncestorSet>>,
    merge_bases: RefCell<HashMap<(CommitId, CommitId), Option<CommitId>>>,
}

impl<'a> RepositoryStore<'a> {
    pub fn new(graph: &'a dyn CommitGraph, ignore: &'a IgnoreFilter) -> Self {
        RepositoryStore {
            graph,
            ignore,
            ancestors: RefCell::new(HashMap::new()),
            merge_bases: RefCell::new(HashMap::new()),
        }
    }

    pub fn graph(&self) -> &'a dyn CommitGraph {
        self.graph
    }

    pub fn commit(&self, id: &CommitId) -> Option<&'a Commit> {
        self.graph.find_commit(id)
    }

    pub fn is_ignored(&self, commit: &Commit) -> bool {
        self.ignore.is_ignored(commit)
    }

    /// Whether `id` is known and not ignored
    pub fn is_visible(&self, id: &CommitId) -> bool {
        self.commit(id).is_some_and(|c| !self.is_ignored(c))
    }

    /// Every commit reachable from `id`, ignored ones included
    pub fn ancestor_set(&self, id: &CommitId) -> AncestorSet {
        if let Some(set) = self.ancestors.borrow().get(id) {
            return Rc::clone(set);
        }
        let set: AncestorSet = Rc::new(
            self.graph
                .ancestors_of(id)
                .map(|c| c.id.clone())
                .collect(),
        );
        self.ancestors
            .borrow_mut()
            .insert(id.clone(), Rc::clone(&set));
        set
    }

    /// Whether `ancestor` is in the history of `descendant` (inclusive)
    pub fn is_ancestor(&self, ancestor: &CommitId, descendant: &CommitId) -> bool {
        self.ancestor_set(descendant).contains(ancestor)
    }

    /// Memoised [CommitGraph::merge_base]
    pub fn merge_base(&self, a: &CommitId, b: &CommitId) -> Option<CommitId> {
        let key = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        if let Some(found) = self.merge_bases.borrow().get(&key) {
            return found.clone();
        }

        let other = self.ancestor_set(&key.1);
        let base = lowest_common_ancestor(self.graph.ancestors_of(&key.0), |id| {
            other.contains(id)
        });
        tracing::trace!(a = %key.0.short(), b = %key.1.short(), base = ?base.as_ref().map(|c| c.short().to_string()), "merge base");
        self.merge_bases.borrow_mut().insert(key, base.clone());
        base
    }

    /// Non-ignored commits reachable from `head` but not from `source`
    ///
    /// Children come before parents. With `source = None` every
    /// reachable commit is returned.
    pub fn commits_since(&self, source: Option<&CommitId>, head: &CommitId) -> Vec<&'a Commit> {
        let excluded = source.map(|s| self.ancestor_set(s));
        self.graph
            .ancestors_of(head)
            .filter(|c| excluded.as_ref().map_or(true, |set| !set.contains(&c.id)))
            .filter(|c| !self.is_ignored(c))
            .collect()
    }

    pub fn count_since(&self, source: Option<&CommitId>, head: &CommitId) -> u64 {
        self.commits_since(source, head).len() as u64
    }

    /// First-parent chain from `head` back to (excluding) the history of
    /// `source`, ignored commits skipped
    ///
    /// Ordered head first.
    pub fn first_parent_since(&self, source: Option<&CommitId>, head: &CommitId) -> Vec<&'a Commit> {
        let excluded = source.map(|s| self.ancestor_set(s));
        let mut chain = Vec::new();
        let mut cursor = self.commit(head);
        while let Some(commit) = cursor {
            if excluded.as_ref().is_some_and(|set| set.contains(&commit.id)) {
                break;
            }
            if !self.is_ignored(commit) {
                chain.push(commit);
            }
            cursor = commit.first_parent().and_then(|p| self.commit(p));
        }
        chain
    }

    /// Tags with a parsable version whose target is visible
    ///
    /// Sorted by version (highest first), then name, so the result does not
    /// depend on the order the provider listed tags in.
    pub fn version_tags(&self, prefix: &Regex, format: SemanticVersionFormat) -> Vec<VersionTag> {
        let mut tags: Vec<VersionTag> = self
            .graph
            .tags()
            .iter()
            .filter(|t| self.is_visible(&t.target))
            .filter_map(|t| match t.version(prefix, format) {
                Some(version) => Some(VersionTag {
                    tag: t.clone(),
                    version,
                }),
                None => {
                    tracing::trace!(tag = %t.name, "skipping tag without a version");
                    None
                }
            })
            .collect();
        tags.sort_by(|a, b| {
            b.version
                .cmp(&a.version)
                .then_with(|| a.tag.name.cmp(&b.tag.name))
        });
        tags
    }

    /// Version tags whose target is in the history of `head`
    pub fn version_tags_reachable_from(
        &self,
        head: &CommitId,
        prefix: &Regex,
        format: SemanticVersionFormat,
    ) -> Vec<VersionTag> {
        let reachable = self.ancestor_set(head);
        self.version_tags(prefix, format)
            .into_iter()
            .filter(|t| reachable.contains(&t.tag.target))
            .collect()
    }

    /// Branches in a stable order: local before remote, then by name
    ///
    /// A remote branch is dropped when a local branch has the same friendly
    /// name.
    pub fn branches(&self) -> Vec<&'a Branch> {
        let all = self.graph.branches();
        let local: HashSet<String> = all
            .iter()
            .filter(|b| !b.is_remote)
            .map(|b| b.friendly_name())
            .collect();
        let mut branches: Vec<&Branch> = all
            .iter()
            .filter(|b| !b.is_remote || !local.contains(&b.friendly_name()))
            .filter(|b| !b.friendly_name().ends_with("HEAD"))
            .collect();
        branches.sort_by(|a, b| {
            a.is_remote
                .cmp(&b.is_remote)
                .then_with(|| a.name.cmp(&b.name))
        });
        branches
    }

    pub fn find_branch(&self, name: &str) -> Option<&'a Branch> {
        self.graph.find_branch(name)
    }

    /// Branches whose history contains `id`, in [Self::branches] order
    pub fn branches_containing(&self, id: &CommitId) -> Vec<&'a Branch> {
        self.branches()
            .into_iter()
            .filter(|b| self.is_ancestor(id, &b.tip))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IgnoreConfig;
    use crate::domain::version::SemanticVersion;
    use crate::git::RepositoryFixture;

    fn prefix() -> Regex {
        Regex::new("^(?:[vV]?)").unwrap()
    }

    #[test]
    fn test_commits_since_counts_diamond_once() {
        let mut fixture = RepositoryFixture::new();
        let root = fixture.commit("root");
        fixture.branch("feature/a");
        fixture.commit("a1");
        fixture.commit("a2");
        fixture.checkout("main");
        fixture.commit("b");
        let merge = fixture.merge_no_ff("feature/a");
        let graph = fixture.snapshot();
        let ignore = IgnoreFilter::none();
        let store = RepositoryStore::new(&graph, &ignore);

        assert_eq!(store.count_since(Some(&root), &merge), 4);
        assert_eq!(store.count_since(None, &merge), 5);
        assert_eq!(store.count_since(Some(&merge), &merge), 0);
    }

    #[test]
    fn test_ignored_commits_are_not_counted_but_traversed() {
        let mut fixture = RepositoryFixture::new();
        let root = fixture.commit("root");
        let skipped = fixture.commit("docs");
        let tip = fixture.commit("fix");
        let graph = fixture.snapshot();
        let ignore = IgnoreFilter::new(&IgnoreConfig {
            shas: vec![skipped.short().to_string()],
            ..IgnoreConfig::default()
        })
        .unwrap();
        let store = RepositoryStore::new(&graph, &ignore);

        assert_eq!(store.count_since(None, &tip), 2);
        assert!(store.is_ancestor(&root, &tip));
        let chain: Vec<&str> = store
            .first_parent_since(None, &tip)
            .iter()
            .map(|c| c.message.as_str())
            .collect();
        assert_eq!(chain, vec!["fix", "root"]);
    }

    #[test]
    fn test_merge_base_is_memoised_symmetrically() {
        let mut fixture = RepositoryFixture::new();
        let root = fixture.commit("root");
        fixture.branch("feature/a");
        let a = fixture.commit("a");
        fixture.checkout("main");
        let b = fixture.commit("b");
        let graph = fixture.snapshot();
        let ignore = IgnoreFilter::none();
        let store = RepositoryStore::new(&graph, &ignore);

        assert_eq!(store.merge_base(&a, &b), Some(root.clone()));
        assert_eq!(store.merge_base(&b, &a), Some(root));
        assert_eq!(store.merge_bases.borrow().len(), 1);
    }

    #[test]
    fn test_version_tags_sorted_and_filtered() {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("root");
        fixture.tag("v1.0.0").tag("not-a-version");
        let head = fixture.commit("next");
        fixture.tag("v1.1.0");
        fixture.branch("feature/x");
        fixture.commit("x");
        fixture.tag("2.0.0");
        let graph = fixture.snapshot();
        let ignore = IgnoreFilter::none();
        let store = RepositoryStore::new(&graph, &ignore);

        let all: Vec<_> = store
            .version_tags(&prefix(), SemanticVersionFormat::Strict)
            .into_iter()
            .map(|t| t.version)
            .collect();
        assert_eq!(
            all,
            vec![
                SemanticVersion::new(2, 0, 0),
                SemanticVersion::new(1, 1, 0),
                SemanticVersion::new(1, 0, 0)
            ]
        );

        let reachable = store.version_tags_reachable_from(&head, &prefix(), SemanticVersionFormat::Strict);
        assert_eq!(reachable.len(), 2);
    }

    #[test]
    fn test_remote_duplicates_of_local_branches_are_dropped() {
        let mut fixture = RepositoryFixture::new();
        let root = fixture.commit("root");
        fixture.remote_branch("origin/main", &root);
        fixture.remote_branch("origin/release/1.0.0", &root);
        let graph = fixture.snapshot();
        let ignore = IgnoreFilter::none();
        let store = RepositoryStore::new(&graph, &ignore);

        let names: Vec<&str> = store.branches().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["main", "origin/release/1.0.0"]);
    }
}
