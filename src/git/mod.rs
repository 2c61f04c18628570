//! Commit graph abstraction layer
//!
//! This module provides a trait-based abstraction over a repository snapshot,
//! allowing the version engine to run against real Git repositories and
//! in-memory graphs built for tests.
//!
//! # Overview
//!
//! The primary abstraction is the [CommitGraph] trait, a read-only view of
//! commits, branches, tags and HEAD. The concrete implementations include:
//!
//! - [memory::InMemoryGraph]: An immutable snapshot held in memory
//! - [repository::Git2Repository]: Loads an [InMemoryGraph] from disk with `git2`
//! - [fixture::RepositoryFixture]: Builds [InMemoryGraph] values step by step
//!
//! [store::RepositoryStore] wraps a graph for the duration of one calculation,
//! applying ignore rules and memoising ancestor sets and merge bases.
//!
//! # Usage
//!
//! ```rust
//! # use branchver::git::{CommitGraph, RepositoryFixture};
//! let mut fixture = RepositoryFixture::new();
//! let first = fixture.commit("initial");
//! fixture.branch("feature/login");
//! let second = fixture.commit("add login form");
//! let graph = fixture.snapshot();
//!
//! assert_eq!(graph.merge_base(&first, &second), Some(first.clone()));
//! assert_eq!(graph.ancestors_of(&second).count(), 2);
//! ```

pub mod fixture;
pub mod memory;
pub mod repository;
pub mod store;

pub use fixture::RepositoryFixture;
pub use memory::InMemoryGraph;
pub use repository::Git2Repository;
pub use store::RepositoryStore;

use crate::domain::branch::Branch;
use crate::domain::commit::{Commit, CommitId};
use crate::domain::tag::Tag;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Read-only view of a repository snapshot
///
/// Implementors only provide lookups; graph queries come as provided
/// methods built on [CommitGraph::find_commit].
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync` so that one snapshot can serve
/// calculations on several threads at once.
///
/// ## Absence
///
/// Missing commits, branches and tags are reported as `None` or as empty
/// collections, never as errors. Deciding whether absence is fatal is up to
/// the caller.
pub trait CommitGraph: Send + Sync {
    /// Look up a commit by id
    ///
    /// # Arguments
    /// * `id` - Full object id of the commit
    ///
    /// # Returns
    /// * `Some(&Commit)` - The commit, if it is part of the snapshot
    /// * `None` - If the snapshot does not contain it
    fn find_commit(&self, id: &CommitId) -> Option<&Commit>;

    /// All branches, local and remote
    fn branches(&self) -> &[Branch];

    /// All tags, peeled to the commit they point at
    fn tags(&self) -> &[Tag];

    /// Commit HEAD points at, `None` for an empty repository
    fn head(&self) -> Option<&CommitId>;

    /// Branch HEAD is attached to, `None` when detached
    fn head_branch(&self) -> Option<&str>;

    /// Find a branch by name
    ///
    /// An exact match wins; otherwise the name is compared with each
    /// branch's friendly name (`origin/develop` matches `develop`), local
    /// branches first.
    fn find_branch(&self, name: &str) -> Option<&Branch> {
        let branches = self.branches();
        branches
            .iter()
            .find(|b| b.name == name)
            .or_else(|| {
                branches
                    .iter()
                    .filter(|b| !b.is_remote)
                    .find(|b| b.friendly_name() == name)
            })
            .or_else(|| {
                branches
                    .iter()
                    .filter(|b| b.is_remote)
                    .find(|b| b.friendly_name() == name)
            })
    }

    /// Lazily walk every commit reachable from `id`
    ///
    /// Commits are yielded in topological order (children before parents).
    /// Among commits that are ready at the same time the most recent
    /// committer time comes first, then the smallest id. Each commit is
    /// yielded once, including `id` itself. Unknown ids yield nothing.
    ///
    /// # Example
    /// ```rust
    /// # use branchver::git::{CommitGraph, RepositoryFixture};
    /// let mut fixture = RepositoryFixture::new();
    /// let root = fixture.commit("root");
    /// let tip = fixture.commit("tip");
    /// let graph = fixture.snapshot();
    /// let order: Vec<_> = graph.ancestors_of(&tip).map(|c| c.id.clone()).collect();
    /// assert_eq!(order, vec![tip, root]);
    /// ```
    fn ancestors_of(&self, id: &CommitId) -> Ancestors<'_> {
        Ancestors::new(Box::new(move |id: &CommitId| self.find_commit(id)), id)
    }

    /// Lowest common ancestor of two commits
    ///
    /// When several commits qualify (criss-cross merges), the one with the
    /// most recent committer time wins, then the smallest id.
    ///
    /// # Returns
    /// * `Some(CommitId)` - The merge base
    /// * `None` - If the histories are unrelated or a commit is unknown
    fn merge_base(&self, a: &CommitId, b: &CommitId) -> Option<CommitId> {
        let other: HashSet<&CommitId> = self.ancestors_of(b).map(|c| &c.id).collect();
        lowest_common_ancestor(self.ancestors_of(a), |id| other.contains(id))
    }

    /// Tags whose target is reachable from `id`
    fn tags_reachable_from(&self, id: &CommitId) -> Vec<&Tag> {
        let reachable: HashSet<&CommitId> = self.ancestors_of(id).map(|c| &c.id).collect();
        self.tags()
            .iter()
            .filter(|t| reachable.contains(&t.target))
            .collect()
    }

    /// Branches whose tip has `id` in its history
    fn branches_containing(&self, id: &CommitId) -> Vec<&Branch> {
        self.branches()
            .iter()
            .filter(|b| self.ancestors_of(&b.tip).any(|c| &c.id == id))
            .collect()
    }
}

type Lookup<'a> = Box<dyn Fn(&CommitId) -> Option<&'a Commit> + 'a>;

/// Iterator returned by [CommitGraph::ancestors_of]
///
/// The reachable set is discovered on construction; ordering work happens
/// as the iterator is consumed.
pub struct Ancestors<'a> {
    lookup: Lookup<'a>,
    /// Children not yet yielded, per commit
    pending_children: HashMap<CommitId, usize>,
    ready: BinaryHeap<(DateTime<Utc>, Reverse<CommitId>)>,
}

impl<'a> Ancestors<'a> {
    fn new(lookup: Lookup<'a>, start: &CommitId) -> Self {
        let mut pending_children: HashMap<CommitId, usize> = HashMap::new();
        let mut ready = BinaryHeap::new();

        if let Some(head) = lookup(start) {
            let mut seen: HashSet<CommitId> = HashSet::new();
            let mut stack = vec![head];
            seen.insert(head.id.clone());
            while let Some(commit) = stack.pop() {
                for (i, parent) in commit.parents.iter().enumerate() {
                    if commit.parents[..i].contains(parent) {
                        continue;
                    }
                    let Some(parent_commit) = lookup(parent) else {
                        continue;
                    };
                    *pending_children.entry(parent.clone()).or_insert(0) += 1;
                    if seen.insert(parent.clone()) {
                        stack.push(parent_commit);
                    }
                }
            }
            ready.push((head.committer_time, Reverse(head.id.clone())));
        }

        Ancestors {
            lookup,
            pending_children,
            ready,
        }
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Commit;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, Reverse(id)) = self.ready.pop()?;
        let commit = (self.lookup)(&id)?;

        let mut released = HashSet::new();
        for parent in &commit.parents {
            // Octopus merges may list a parent twice
            if !released.insert(parent) {
                continue;
            }
            if let Some(count) = self.pending_children.get_mut(parent) {
                *count -= 1;
                if *count == 0 {
                    if let Some(parent_commit) = (self.lookup)(parent) {
                        self.ready
                            .push((parent_commit.committer_time, Reverse(parent.clone())));
                    }
                }
            }
        }
        Some(commit)
    }
}

/// Walk `ancestors` (children first) and pick the best commit accepted by
/// `is_common` that is not itself an ancestor of another accepted commit.
pub(crate) fn lowest_common_ancestor<'a>(
    ancestors: impl Iterator<Item = &'a Commit>,
    is_common: impl Fn(&CommitId) -> bool,
) -> Option<CommitId> {
    let mut covered: HashSet<CommitId> = HashSet::new();
    let mut best: Option<&Commit> = None;

    for commit in ancestors {
        if covered.contains(&commit.id) {
            covered.extend(commit.parents.iter().cloned());
            continue;
        }
        if is_common(&commit.id) {
            covered.extend(commit.parents.iter().cloned());
            best = match best {
                Some(current)
                    if (current.committer_time, Reverse(&current.id))
                        >= (commit.committer_time, Reverse(&commit.id)) =>
                {
                    Some(current)
                }
                _ => Some(commit),
            };
        }
    }

    best.map(|c| c.id.clone())
}
