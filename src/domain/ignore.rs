//! Commit exclusion rules
//!
//! Ignored commits are transparent to every walk: their parents stay
//! reachable, but the commits themselves are never counted, never scanned for
//! bump directives, and tags pointing at them never produce versions.

use crate::config::IgnoreConfig;
use crate::domain::commit::Commit;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled form of [`IgnoreConfig`]
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    before: Option<DateTime<Utc>>,
    shas: Vec<String>,
    paths: Option<GlobSet>,
}

impl IgnoreFilter {
    pub fn new(config: &IgnoreConfig) -> Result<Self> {
        let paths = if config.paths.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &config.paths {
                let glob = Glob::new(pattern).map_err(|e| {
                    Error::config(format!("Invalid ignore path '{}': {}", pattern, e))
                })?;
                builder.add(glob);
            }
            Some(
                builder
                    .build()
                    .map_err(|e| Error::config(format!("Invalid ignore paths: {}", e)))?,
            )
        };

        Ok(IgnoreFilter {
            before: config.before,
            shas: config.shas.iter().map(|s| s.to_ascii_lowercase()).collect(),
            paths,
        })
    }

    /// A filter that keeps every commit
    pub fn none() -> Self {
        IgnoreFilter {
            before: None,
            shas: Vec::new(),
            paths: None,
        }
    }

    pub fn is_ignored(&self, commit: &Commit) -> bool {
        if let Some(before) = self.before {
            if commit.committer_time < before {
                return true;
            }
        }

        let id = commit.id.as_str().to_ascii_lowercase();
        if self.shas.iter().any(|sha| !sha.is_empty() && id.starts_with(sha.as_str())) {
            return true;
        }

        match &self.paths {
            Some(globs) if !commit.paths.is_empty() => {
                commit.paths.iter().all(|path| globs.is_match(path))
            }
            _ => false,
        }
    }
}
