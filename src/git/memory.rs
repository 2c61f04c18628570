use crate::domain::branch::Branch;
use crate::domain::commit::{Commit, CommitId};
use crate::domain::tag::Tag;
use crate::git::CommitGraph;
use std::collections::HashMap;

/// Immutable repository snapshot held in memory
///
/// Produced by [super::RepositoryFixture] and [super::Git2Repository]; can
/// also be filled by hand.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraph {
    commits: HashMap<CommitId, Commit>,
    branches: Vec<Branch>,
    tags: Vec<Tag>,
    head: Option<CommitId>,
    head_branch: Option<String>,
}

impl InMemoryGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit to the graph
    pub fn add_commit(&mut self, commit: Commit) {
        self.commits.insert(commit.id.clone(), commit);
    }

    /// Add or move a branch
    pub fn add_branch(&mut self, branch: Branch) {
        match self
            .branches
            .iter_mut()
            .find(|b| b.name == branch.name && b.is_remote == branch.is_remote)
        {
            Some(existing) => existing.tip = branch.tip,
            None => self.branches.push(branch),
        }
    }

    /// Set a local branch head
    pub fn set_branch_head(&mut self, branch: impl Into<String>, tip: CommitId) {
        self.add_branch(Branch::new(branch, tip));
    }

    pub fn remove_branch(&mut self, name: &str) {
        self.branches.retain(|b| b.name != name);
        if self.head_branch.as_deref() == Some(name) {
            self.head_branch = None;
        }
    }

    /// Add a tag pointing to a commit
    pub fn add_tag(&mut self, tag: Tag) {
        self.tags.retain(|t| t.name != tag.name);
        self.tags.push(tag);
    }

    /// Attach HEAD to a branch
    pub fn set_head(&mut self, branch: impl Into<String>, commit: Option<CommitId>) {
        self.head_branch = Some(branch.into());
        self.head = commit;
    }

    /// Detach HEAD at a commit
    pub fn detach_head(&mut self, commit: CommitId) {
        self.head_branch = None;
        self.head = Some(commit);
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }
}

impl CommitGraph for InMemoryGraph {
    fn find_commit(&self, id: &CommitId) -> Option<&Commit> {
        self.commits.get(id)
    }

    fn branches(&self) -> &[Branch] {
        &self.branches
    }

    fn tags(&self) -> &[Tag] {
        &self.tags
    }

    fn head(&self) -> Option<&CommitId> {
        self.head.as_ref()
    }

    fn head_branch(&self) -> Option<&str> {
        self.head_branch.as_deref()
    }
}
