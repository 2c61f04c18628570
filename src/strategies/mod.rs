//! Base version strategies
//!
//! Each strategy inspects the calculation context and proposes zero or more
//! [BaseVersionCandidate]s. The arbiter in [crate::calculator::arbiter]
//! picks the winner; strategies never compare against each other.

pub mod configured;
pub mod fallback;
pub mod mainline;
pub mod merge_message;
pub mod tagged_commit;
pub mod track_release;
pub mod trunk_based;
pub mod version_in_branch;

use crate::calculator::CalculationContext;
use crate::domain::commit::CommitId;
use crate::domain::version::SemanticVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a strategy; declaration order breaks ties in the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyKind {
    Fallback,
    ConfiguredNextVersion,
    MergeMessage,
    TaggedCommit,
    TrackReleaseBranches,
    VersionInBranchName,
    Mainline,
    TrunkBased,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 8] = [
        StrategyKind::Fallback,
        StrategyKind::ConfiguredNextVersion,
        StrategyKind::MergeMessage,
        StrategyKind::TaggedCommit,
        StrategyKind::TrackReleaseBranches,
        StrategyKind::VersionInBranchName,
        StrategyKind::Mainline,
        StrategyKind::TrunkBased,
    ];

    /// Enabled unless a workflow or the user says otherwise
    pub const DEFAULT: [StrategyKind; 6] = [
        StrategyKind::Fallback,
        StrategyKind::ConfiguredNextVersion,
        StrategyKind::MergeMessage,
        StrategyKind::TaggedCommit,
        StrategyKind::TrackReleaseBranches,
        StrategyKind::VersionInBranchName,
    ];

    /// The implementation of this strategy
    pub fn strategy(self) -> &'static dyn VersionStrategy {
        match self {
            StrategyKind::Fallback => &fallback::FallbackStrategy,
            StrategyKind::ConfiguredNextVersion => &configured::ConfiguredNextVersionStrategy,
            StrategyKind::MergeMessage => &merge_message::MergeMessageStrategy,
            StrategyKind::TaggedCommit => &tagged_commit::TaggedCommitStrategy,
            StrategyKind::TrackReleaseBranches => &track_release::TrackReleaseBranchesStrategy,
            StrategyKind::VersionInBranchName => &version_in_branch::VersionInBranchNameStrategy,
            StrategyKind::Mainline => &mainline::MainlineStrategy,
            StrategyKind::TrunkBased => &trunk_based::TrunkBasedStrategy,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A proposed starting point for the calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseVersionCandidate {
    pub version: SemanticVersion,
    /// Commit counting starts after this one; `None` counts from the root
    pub source: Option<CommitId>,
    pub should_increment: bool,
    pub strategy: StrategyKind,
    pub description: String,
}

impl BaseVersionCandidate {
    pub fn new(
        strategy: StrategyKind,
        version: SemanticVersion,
        source: Option<CommitId>,
        should_increment: bool,
        description: impl Into<String>,
    ) -> Self {
        BaseVersionCandidate {
            version,
            source,
            should_increment,
            strategy,
            description: description.into(),
        }
    }
}

/// A source of base version candidates
pub trait VersionStrategy: Sync {
    fn kind(&self) -> StrategyKind;

    /// Candidates for the evaluated branch; empty when the strategy does not
    /// apply
    fn candidates(&self, ctx: &CalculationContext<'_>) -> Vec<BaseVersionCandidate>;
}

/// Strategies enabled by `kinds`, deduplicated, in declaration order
pub fn enabled(kinds: &[StrategyKind]) -> Vec<&'static dyn VersionStrategy> {
    StrategyKind::ALL
        .iter()
        .filter(|kind| kinds.contains(kind))
        .map(|kind| kind.strategy())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_follows_declaration_order() {
        let strategies = enabled(&[
            StrategyKind::TaggedCommit,
            StrategyKind::Fallback,
            StrategyKind::TaggedCommit,
        ]);
        let kinds: Vec<StrategyKind> = strategies.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![StrategyKind::Fallback, StrategyKind::TaggedCommit]);
    }

    #[test]
    fn test_every_kind_maps_to_its_strategy() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.strategy().kind(), kind);
        }
    }

    #[test]
    fn test_default_excludes_walkers() {
        assert!(!StrategyKind::DEFAULT.contains(&StrategyKind::Mainline));
        assert!(!StrategyKind::DEFAULT.contains(&StrategyKind::TrunkBased));
    }
}
