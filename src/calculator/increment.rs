use crate::calculator::CalculationContext;
use crate::config::{CommitMessageIncrementMode, EffectiveBranchConfiguration, GlobalSettings, IncrementStrategy};
use crate::domain::commit::{Commit, CommitId, ParsedCommit};
use crate::domain::version::VersionField;
use crate::strategies::BaseVersionCandidate;
use std::collections::HashSet;

/// Longest `Inherit` chain followed before falling back to a patch bump
pub const MAX_INHERIT_DEPTH: usize = 16;

/// Reads bump directives out of commit messages
pub struct MessageAnalyzer<'g> {
    global: &'g GlobalSettings,
}

impl<'g> MessageAnalyzer<'g> {
    /// Create a new message analyzer
    pub fn new(global: &'g GlobalSettings) -> Self {
        MessageAnalyzer { global }
    }

    /// Strongest directive in one message
    ///
    /// `+semver:` directives always count; Conventional Commit headers only
    /// when enabled.
    pub fn analyze_message(&self, message: &str) -> Option<VersionField> {
        let mut found = None;

        let directives = [
            (&self.global.major_bump, VersionField::Major),
            (&self.global.minor_bump, VersionField::Minor),
            (&self.global.patch_bump, VersionField::Patch),
            (&self.global.no_bump, VersionField::None),
        ];
        for (regex, field) in directives {
            if regex.is_match(message) {
                found = found.max(Some(field));
            }
        }

        if self.global.conventional_commits {
            if let Some(field) = ParsedCommit::parse(message).and_then(|p| p.increment()) {
                found = found.max(Some(field));
            }
        }

        found
    }

    /// Strongest directive across commits, honouring the configured mode
    pub fn analyze_commits<'c>(
        &self,
        commits: impl IntoIterator<Item = &'c Commit>,
    ) -> Option<VersionField> {
        let mode = self.global.commit_message_incrementing;
        if mode == CommitMessageIncrementMode::Disabled {
            return None;
        }

        commits
            .into_iter()
            .filter(|c| mode != CommitMessageIncrementMode::MergeMessageOnly || c.is_merge())
            .filter_map(|c| self.analyze_message(&c.message))
            .max()
    }
}

/// Combine a branch default with the directives found
///
/// No directive keeps the default; only `none` directives suppress the
/// bump; otherwise the stronger of the two wins.
pub fn combine(default: VersionField, directive: Option<VersionField>) -> VersionField {
    match directive {
        None => default,
        Some(VersionField::None) => VersionField::None,
        Some(field) => field.max(default),
    }
}

/// Field for a concrete increment strategy
pub fn field_of(strategy: IncrementStrategy) -> Option<VersionField> {
    match strategy {
        IncrementStrategy::None => Some(VersionField::None),
        IncrementStrategy::Patch => Some(VersionField::Patch),
        IncrementStrategy::Minor => Some(VersionField::Minor),
        IncrementStrategy::Major => Some(VersionField::Major),
        IncrementStrategy::Inherit => None,
    }
}

/// Increment of a branch with `Inherit` followed through branch points
///
/// Without a branch point the first source type with a concrete increment
/// is used. Loops and chains deeper than [MAX_INHERIT_DEPTH] end in a patch
/// bump.
pub fn resolve_increment(
    ctx: &CalculationContext<'_>,
    config: &EffectiveBranchConfiguration,
    name: &str,
    tip: &CommitId,
) -> VersionField {
    let mut visited: HashSet<String> = HashSet::new();
    let mut current_config = config;
    let mut current_name = name.to_string();
    let mut current_tip = tip.clone();

    for _ in 0..MAX_INHERIT_DEPTH {
        if let Some(field) = field_of(current_config.increment) {
            return field;
        }
        if !visited.insert(current_name.clone()) {
            tracing::debug!(branch = %current_name, "inherit loop, using patch");
            return VersionField::Patch;
        }

        match ctx.branch_point_of(&current_name, &current_tip, current_config) {
            Some(point) => {
                current_config = point.config;
                current_name = point.branch.friendly_name();
                current_tip = point.commit;
            }
            None => {
                return current_config
                    .source_branches
                    .iter()
                    .filter_map(|t| ctx.resolver.for_type(t))
                    .find_map(|c| field_of(c.increment))
                    .unwrap_or(VersionField::Patch);
            }
        }
    }

    tracing::debug!(branch = %name, "inherit chain too deep, using patch");
    VersionField::Patch
}

/// Commits whose messages may raise the increment of a candidate
pub fn commits_for<'a>(
    ctx: &CalculationContext<'a>,
    source: Option<&CommitId>,
) -> Vec<&'a Commit> {
    if ctx.config.prevent_increment_of_merged_branch {
        ctx.store.first_parent_since(source, ctx.head_id())
    } else {
        ctx.store.commits_since(source, ctx.head_id())
    }
}

/// Increment applied to a candidate
pub fn increment_for(ctx: &CalculationContext<'_>, candidate: &BaseVersionCandidate) -> VersionField {
    if !candidate.should_increment {
        return VersionField::None;
    }
    let commits = commits_for(ctx, candidate.source.as_ref());
    let directive = ctx.analyzer().analyze_commits(commits);
    combine(ctx.branch_increment(), directive)
}
