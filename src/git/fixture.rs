//! Scripted repository builder
//!
//! [RepositoryFixture] mimics the handful of git porcelain commands needed
//! to describe a branching workflow and hands out immutable
//! [InMemoryGraph] snapshots. Commit ids are deterministic and committer
//! times strictly increase, so two fixtures built by the same script yield
//! identical graphs.
//!
//! Misusing the script (checking out or merging a branch that does not
//! exist, merging before the first commit) panics, like an out-of-bounds
//! index would.

use crate::domain::branch::Branch;
use crate::domain::commit::{Commit, CommitId};
use crate::domain::tag::Tag;
use crate::git::memory::InMemoryGraph;
use crate::git::CommitGraph;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Builder producing [InMemoryGraph] snapshots
#[derive(Debug, Clone)]
pub struct RepositoryFixture {
    graph: InMemoryGraph,
    /// Branch HEAD is attached to; `None` when detached
    current: Option<String>,
    head: Option<CommitId>,
    sequence: u64,
    epoch: DateTime<Utc>,
}

impl Default for RepositoryFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryFixture {
    /// Empty repository with HEAD on an unborn `main`
    pub fn new() -> Self {
        Self::with_default_branch("main")
    }

    pub fn with_default_branch(name: &str) -> Self {
        RepositoryFixture {
            graph: InMemoryGraph::new(),
            current: Some(name.to_string()),
            head: None,
            sequence: 0,
            epoch: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }

    /// Commit HEAD points at
    pub fn head(&self) -> Option<&CommitId> {
        self.head.as_ref()
    }

    /// Current branch, `None` when detached
    pub fn current_branch(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Time the next commit will carry
    pub fn next_commit_time(&self) -> DateTime<Utc> {
        self.epoch + Duration::minutes(self.sequence as i64 + 1)
    }

    /// Record a commit on top of HEAD
    pub fn commit(&mut self, message: &str) -> CommitId {
        self.commit_with_paths(message, &[])
    }

    /// Record a commit touching `paths`
    pub fn commit_with_paths(&mut self, message: &str, paths: &[&str]) -> CommitId {
        let parents: Vec<CommitId> = self.head.iter().cloned().collect();
        self.record(message, parents, paths)
    }

    /// Create a branch at HEAD and check it out (`git checkout -b`)
    pub fn branch(&mut self, name: &str) -> &mut Self {
        if let Some(head) = self.head.clone() {
            self.graph.set_branch_head(name, head);
        }
        self.current = Some(name.to_string());
        self
    }

    /// Create a branch at `commit` without checking it out
    pub fn branch_at(&mut self, name: &str, commit: &CommitId) -> &mut Self {
        self.graph.set_branch_head(name, commit.clone());
        self
    }

    /// Create a remote-tracking branch at `commit`
    pub fn remote_branch(&mut self, name: &str, commit: &CommitId) -> &mut Self {
        self.graph.add_branch(Branch::remote(name, commit.clone()));
        self
    }

    /// Attach HEAD to an existing branch
    ///
    /// # Panics
    /// If the branch does not exist.
    pub fn checkout(&mut self, name: &str) -> &mut Self {
        self.head = Some(self.tip_of(name));
        self.current = Some(name.to_string());
        self
    }

    /// Detach HEAD at a commit
    pub fn checkout_commit(&mut self, commit: &CommitId) -> &mut Self {
        self.head = Some(commit.clone());
        self.current = None;
        self
    }

    /// Merge a branch into the current one, fast-forwarding when possible
    ///
    /// # Panics
    /// If the branch does not exist or HEAD has no commit yet.
    pub fn merge(&mut self, name: &str) -> CommitId {
        let theirs = self.tip_of(name);
        let ours = self.head_or_panic();
        if self.graph.ancestors_of(&theirs).any(|c| c.id == ours) {
            self.move_head(theirs.clone());
            return theirs;
        }
        self.merge_no_ff(name)
    }

    /// Merge a branch with an explicit merge commit
    ///
    /// # Panics
    /// If the branch does not exist or HEAD has no commit yet.
    pub fn merge_no_ff(&mut self, name: &str) -> CommitId {
        self.merge_many(&[name])
    }

    /// Merge several branches at once (octopus merge)
    ///
    /// # Panics
    /// If a branch does not exist or HEAD has no commit yet.
    pub fn merge_many(&mut self, names: &[&str]) -> CommitId {
        let mut parents = vec![self.head_or_panic()];
        parents.extend(names.iter().map(|name| self.tip_of(name)));
        let message = self.merge_message(names);
        self.record(&message, parents, &[])
    }

    /// Record a merge commit with a custom message
    ///
    /// # Panics
    /// If the branch does not exist or HEAD has no commit yet.
    pub fn merge_with_message(&mut self, name: &str, message: &str) -> CommitId {
        let parents = vec![self.head_or_panic(), self.tip_of(name)];
        self.record(message, parents, &[])
    }

    /// Lightweight tag at HEAD
    ///
    /// # Panics
    /// If HEAD has no commit yet.
    pub fn tag(&mut self, name: &str) -> &mut Self {
        let head = self.head_or_panic();
        self.tag_at(name, &head)
    }

    /// Lightweight tag at `commit`
    pub fn tag_at(&mut self, name: &str, commit: &CommitId) -> &mut Self {
        self.graph.add_tag(Tag::new(name, commit.clone()));
        self
    }

    /// Annotated tag at HEAD, annotated at the next commit time
    ///
    /// # Panics
    /// If HEAD has no commit yet.
    pub fn annotated_tag(&mut self, name: &str) -> &mut Self {
        let head = self.head_or_panic();
        let mut tag = Tag::new(name, head);
        tag.annotation_time = Some(self.next_commit_time());
        self.graph.add_tag(tag);
        self
    }

    /// Delete a branch; HEAD stays on its commit
    pub fn remove_branch(&mut self, name: &str) -> &mut Self {
        self.graph.remove_branch(name);
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        self
    }

    /// Tip of a branch
    ///
    /// # Panics
    /// If the branch does not exist.
    pub fn tip_of(&self, name: &str) -> CommitId {
        match self.graph.find_branch(name) {
            Some(branch) => branch.tip.clone(),
            None => panic!("fixture has no branch named '{}'", name),
        }
    }

    /// Immutable copy of the repository as it stands
    pub fn snapshot(&self) -> InMemoryGraph {
        let mut graph = self.graph.clone();
        match (&self.current, &self.head) {
            (Some(branch), head) => graph.set_head(branch.clone(), head.clone()),
            (None, Some(head)) => graph.detach_head(head.clone()),
            (None, None) => {}
        }
        graph
    }

    fn head_or_panic(&self) -> CommitId {
        match &self.head {
            Some(head) => head.clone(),
            None => panic!("fixture has no commits yet"),
        }
    }

    fn merge_message(&self, names: &[&str]) -> String {
        let sources = names
            .iter()
            .map(|n| format!("'{}'", n))
            .collect::<Vec<_>>()
            .join(", ");
        let noun = if names.len() > 1 { "branches" } else { "branch" };
        match self.current.as_deref() {
            Some("main") | Some("master") | None => format!("Merge {} {}", noun, sources),
            Some(current) => format!("Merge {} {} into {}", noun, sources, current),
        }
    }

    fn record(&mut self, message: &str, parents: Vec<CommitId>, paths: &[&str]) -> CommitId {
        self.sequence += 1;
        let when = self.epoch + Duration::minutes(self.sequence as i64);
        let id = CommitId::new(object_id(self.sequence));
        self.graph.add_commit(Commit {
            id: id.clone(),
            parents,
            author_time: when,
            committer_time: when,
            message: message.to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
        });
        self.move_head(id.clone());
        id
    }

    fn move_head(&mut self, id: CommitId) {
        if let Some(branch) = &self.current {
            self.graph.set_branch_head(branch.clone(), id.clone());
        }
        self.head = Some(id);
    }
}

/// Forty hex digits derived from a sequence number with splitmix64
fn object_id(sequence: u64) -> String {
    let mut state = sequence;
    let mut next = || {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    };
    let (a, b, c) = (next(), next(), next());
    format!("{:016x}{:016x}{:08x}", a, b, c as u32)
}
