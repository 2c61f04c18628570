//! Picks one base version out of every strategy's proposals

use crate::calculator::increment;
use crate::calculator::CalculationContext;
use crate::domain::prerelease::PreReleaseTag;
use crate::domain::version::{SemanticVersion, VersionField};
use crate::error::{Error, Result};
use crate::strategies::{BaseVersionCandidate, StrategyKind};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A candidate with its increment applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedCandidate {
    pub candidate: BaseVersionCandidate,
    pub increment: VersionField,
    /// Incremented version, labelled for comparison when the branch has a
    /// label
    pub effective: SemanticVersion,
    source_time: Option<DateTime<Utc>>,
    order: usize,
}

impl EvaluatedCandidate {
    /// Whether this is a tag on HEAD that is used verbatim
    pub fn is_exact_tag(&self, ctx: &CalculationContext<'_>) -> bool {
        self.candidate.strategy == StrategyKind::TaggedCommit
            && !self.candidate.should_increment
            && self.candidate.source.as_ref().is_some_and(|s| ctx.is_head(s))
    }

    fn precedence(&self, other: &Self) -> Ordering {
        other
            .effective
            .cmp(&self.effective)
            .then_with(|| self.candidate.should_increment.cmp(&other.candidate.should_increment))
            .then_with(|| other.source_time.cmp(&self.source_time))
            .then_with(|| self.candidate.strategy.cmp(&other.candidate.strategy))
            .then_with(|| self.order.cmp(&other.order))
    }
}

/// Apply the increment of each candidate
pub fn evaluate(
    ctx: &CalculationContext<'_>,
    candidates: Vec<BaseVersionCandidate>,
) -> Vec<EvaluatedCandidate> {
    let label = (!ctx.label.is_empty()).then_some(ctx.label.as_str());

    candidates
        .into_iter()
        .enumerate()
        .map(|(order, candidate)| {
            let increment = increment::increment_for(ctx, &candidate);
            let mut effective = candidate.version.increment(increment, label);
            if let Some(label) = label {
                if effective.pre_release.is_empty() {
                    effective = effective.with_pre_release(PreReleaseTag::new(label, Some(1)));
                }
            }
            let source_time = candidate
                .source
                .as_ref()
                .and_then(|s| ctx.store.commit(s))
                .map(|c| c.committer_time);

            tracing::debug!(
                strategy = %candidate.strategy,
                base = %candidate.version,
                increment = ?increment,
                effective = %effective,
                source = ?candidate.source.as_ref().map(|s| s.short().to_string()),
                "{}",
                candidate.description
            );

            EvaluatedCandidate {
                candidate,
                increment,
                effective,
                source_time,
                order,
            }
        })
        .collect()
}

/// The winning candidate
///
/// # Errors
/// [Error::NoCommitsFound] when there is nothing to choose from.
pub fn select(ctx: &CalculationContext<'_>, mut evaluated: Vec<EvaluatedCandidate>) -> Result<EvaluatedCandidate> {
    evaluated.sort_by(|a, b| a.precedence(b));
    let winner = evaluated
        .into_iter()
        .next()
        .ok_or_else(|| Error::no_commits(ctx.branch_name.clone()))?;
    tracing::debug!(
        strategy = %winner.candidate.strategy,
        effective = %winner.effective,
        "selected base version"
    );
    Ok(winner)
}
