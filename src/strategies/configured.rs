use super::{BaseVersionCandidate, StrategyKind, VersionStrategy};
use crate::calculator::CalculationContext;

/// The configured `next_version`, used as is
///
/// The candidate has no source commit, so commits are counted from the root.
/// Introducing `next_version` then never resets the commit count.
pub struct ConfiguredNextVersionStrategy;

impl VersionStrategy for ConfiguredNextVersionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConfiguredNextVersion
    }

    fn candidates(&self, ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
        match &ctx.global().next_version {
            Some(version) => vec![BaseVersionCandidate::new(
                StrategyKind::ConfiguredNextVersion,
                version.clone(),
                None,
                false,
                "NextVersion in configuration file",
            )],
            None => Vec::new(),
        }
    }
}
