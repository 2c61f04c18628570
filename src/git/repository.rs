use crate::domain::branch::Branch;
use crate::domain::commit::{Commit, CommitId};
use crate::domain::tag::Tag;
use crate::error::Result;
use crate::git::memory::InMemoryGraph;
use chrono::{DateTime, TimeZone, Utc};
use git2::{Oid, Repository as Git2Repo};
use std::path::Path;

/// Read-only access to an on-disk repository
///
/// The repository is only read once, by [Git2Repository::snapshot]; the
/// engine then works on the returned [InMemoryGraph].
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Load commits, branches, tags and HEAD
    ///
    /// With `include_paths` every commit is diffed against its first parent
    /// so path-based ignore rules can apply; this is the slow part on large
    /// histories.
    pub fn snapshot(&self, include_paths: bool) -> Result<InMemoryGraph> {
        let mut graph = InMemoryGraph::new();
        let mut tips: Vec<Oid> = Vec::new();

        for entry in self.repo.branches(None)? {
            let (branch, kind) = entry?;
            let Some(name) = branch.name()?.map(str::to_string) else {
                continue;
            };
            let Some(target) = branch.get().target() else {
                // symbolic refs such as origin/HEAD
                continue;
            };
            tips.push(target);
            let id = CommitId::new(target.to_string());
            graph.add_branch(match kind {
                git2::BranchType::Local => Branch::new(name, id),
                git2::BranchType::Remote => Branch::remote(name, id),
            });
        }

        for name in self.repo.tag_names(None)?.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            let Ok(commit) = reference.peel_to_commit() else {
                tracing::trace!(tag = %name, "tag does not point at a commit");
                continue;
            };
            let annotation_time = reference
                .peel_to_tag()
                .ok()
                .and_then(|tag| tag.tagger().map(|sig| to_utc(sig.when())));
            tips.push(commit.id());
            graph.add_tag(Tag {
                name: name.to_string(),
                target: CommitId::new(commit.id().to_string()),
                annotation_time,
            });
        }

        let head = self.repo.head().ok();
        let head_commit = head.as_ref().and_then(|h| h.target());
        if let Some(oid) = head_commit {
            tips.push(oid);
        }

        let mut revwalk = self.repo.revwalk()?;
        for tip in &tips {
            revwalk.push(*tip)?;
        }
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let paths = if include_paths {
                self.changed_paths(&commit)?
            } else {
                Vec::new()
            };
            graph.add_commit(Commit {
                id: CommitId::new(commit.id().to_string()),
                parents: commit.parent_ids().map(|p| CommitId::new(p.to_string())).collect(),
                author_time: to_utc(commit.author().when()),
                committer_time: to_utc(commit.committer().when()),
                message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
                paths,
            });
        }

        let head_id = head_commit.map(|oid| CommitId::new(oid.to_string()));
        match head.as_ref().filter(|h| h.is_branch()).and_then(|h| h.shorthand()) {
            Some(branch) => graph.set_head(branch, head_id),
            None => {
                if let Some(id) = head_id {
                    graph.detach_head(id);
                }
            }
        }

        tracing::debug!(
            commits = graph.commit_count(),
            tips = tips.len(),
            "loaded repository snapshot"
        );
        Ok(graph)
    }

    /// Paths touched relative to the first parent; merges report none
    fn changed_paths(&self, commit: &git2::Commit<'_>) -> Result<Vec<String>> {
        if commit.parent_count() > 1 {
            return Ok(Vec::new());
        }
        let tree = commit.tree()?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        Ok(diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|path| path.to_string_lossy().replace('\\', "/"))
            .collect())
    }
}

fn to_utc(time: git2::Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::CommitGraph;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn commit_file(repo: &Git2Repo, dir: &Path, file: &str, message: &str) -> Oid {
        fs::write(dir.join(file), message).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    #[test]
    fn test_snapshot_reads_commits_tags_and_head() {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        let first = commit_file(&repo, dir.path(), "a.txt", "initial");
        {
            let object = repo.find_object(first, None).unwrap();
            repo.tag_lightweight("v1.0.0", &object, false).unwrap();
        }
        let second = commit_file(&repo, dir.path(), "docs.md", "docs");

        let graph = Git2Repository::from_git2(repo).snapshot(true).unwrap();

        assert_eq!(graph.commit_count(), 2);
        assert_eq!(graph.head(), Some(&CommitId::new(second.to_string())));
        assert!(graph.head_branch().is_some());
        assert_eq!(graph.tags().len(), 1);
        assert_eq!(graph.tags()[0].target, CommitId::new(first.to_string()));

        let head = graph.find_commit(&CommitId::new(second.to_string())).unwrap();
        assert_eq!(head.paths, vec!["docs.md".to_string()]);
        assert_eq!(head.parents, vec![CommitId::new(first.to_string())]);
    }

    #[test]
    fn test_non_utf8_message_keeps_directive() {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        let first = commit_file(&repo, dir.path(), "a.txt", "initial");
        let tree = repo.find_commit(first).unwrap().tree_id();

        let mut raw = format!(
            "tree {}\nparent {}\nauthor Test <test@example.com> 1700000000 +0000\n\
             committer Test <test@example.com> 1700000000 +0000\nencoding ISO-8859-1\n\n",
            tree, first
        )
        .into_bytes();
        raw.extend_from_slice(b"Caf\xe9 fix\n\n+semver: minor\n");
        let latin1 = repo
            .odb()
            .unwrap()
            .write(git2::ObjectType::Commit, &raw)
            .unwrap();
        repo.reference("refs/heads/latin1", latin1, false, "latin-1 commit")
            .unwrap();

        let graph = Git2Repository::from_git2(repo).snapshot(false).unwrap();
        let commit = graph.find_commit(&CommitId::new(latin1.to_string())).unwrap();
        assert!(commit.message.starts_with("Caf"));
        assert!(commit.message.contains("+semver: minor"));
    }

    #[test]
    fn test_open_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Git2Repository::open(dir.path()).is_err());
    }
}
