use super::{BaseVersionCandidate, StrategyKind, VersionStrategy};
use crate::calculator::CalculationContext;
use crate::domain::version::SemanticVersion;

/// `0.0.0` from the root, always incremented
pub struct FallbackStrategy;

impl VersionStrategy for FallbackStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Fallback
    }

    fn candidates(&self, _ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate> {
        vec![BaseVersionCandidate::new(
            StrategyKind::Fallback,
            SemanticVersion::new(0, 0, 0),
            None,
            true,
            "Fallback base version",
        )]
    }
}
