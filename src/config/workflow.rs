//! Built-in branching workflows
//!
//! Each preset is a complete [`Config`] whose values sit below the user's
//! own settings.

use super::{BranchConfig, BranchTypeConfig, Config, DeploymentMode, IncrementStrategy};
use crate::strategies::StrategyKind;
use serde::{Deserialize, Serialize};

pub const MAIN_REGEX: &str = r"^master$|^main$";
pub const DEVELOP_REGEX: &str = r"^dev(elop)?(ment)?$";
pub const RELEASE_REGEX: &str = r"^releases?[/-](?P<BranchName>.+)";
pub const FEATURE_REGEX: &str = r"^features?[/-](?P<BranchName>.+)";
pub const HOTFIX_REGEX: &str = r"^hotfix(es)?[/-](?P<BranchName>.+)";
pub const SUPPORT_REGEX: &str = r"^support[/-](?P<BranchName>.+)";
pub const PULL_REQUEST_REGEX: &str = r"^(pull|pull-requests|pr)[/-](?P<Number>\d*)";
pub const UNKNOWN_REGEX: &str = r"(?P<BranchName>.+)";

/// Branching model supplying the default configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workflow {
    /// main, develop, release, feature, hotfix, support and pull requests
    #[default]
    GitFlow,
    /// main plus short-lived branches
    GitHubFlow,
    /// Every merge into main bumps the version
    Mainline,
    /// Every commit on main bumps the version
    TrunkBased,
}

impl Workflow {
    /// The preset configuration of this workflow
    pub fn preset(self) -> Config {
        match self {
            Workflow::GitFlow => git_flow(),
            Workflow::GitHubFlow => github_flow(),
            Workflow::Mainline => trunk(StrategyKind::Mainline),
            Workflow::TrunkBased => trunk(StrategyKind::TrunkBased),
        }
    }
}

fn names(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|s| s.to_string()).collect())
}

fn branch(name: &str, settings: BranchConfig) -> BranchTypeConfig {
    BranchTypeConfig::new(name, settings)
}

fn main_branch(mode: DeploymentMode) -> BranchConfig {
    BranchConfig {
        regex: Some(MAIN_REGEX.to_string()),
        increment: Some(IncrementStrategy::Patch),
        label: Some(String::new()),
        deployment_mode: Some(mode),
        is_main_branch: Some(true),
        source_branches: names(&[]),
        prevent_increment_of_merged_branch: Some(true),
        track_merge_message: Some(true),
        pre_release_weight: Some(55000),
        ..BranchConfig::default()
    }
}

fn short_lived(regex: &str, label: &str, mode: DeploymentMode, sources: &[&str]) -> BranchConfig {
    BranchConfig {
        regex: Some(regex.to_string()),
        increment: Some(IncrementStrategy::Inherit),
        label: Some(label.to_string()),
        deployment_mode: Some(mode),
        source_branches: names(sources),
        prevent_increment_when_current_commit_tagged: Some(false),
        pre_release_weight: Some(30000),
        ..BranchConfig::default()
    }
}

fn git_flow() -> Config {
    Config {
        branches: vec![
            branch("main", main_branch(DeploymentMode::ContinuousDelivery)),
            branch(
                "develop",
                BranchConfig {
                    regex: Some(DEVELOP_REGEX.to_string()),
                    increment: Some(IncrementStrategy::Minor),
                    label: Some("alpha".to_string()),
                    deployment_mode: Some(DeploymentMode::ContinuousDelivery),
                    source_branches: names(&["main"]),
                    tracks_release_branches: Some(true),
                    track_merge_target: Some(true),
                    pre_release_weight: Some(0),
                    ..BranchConfig::default()
                },
            ),
            branch(
                "release",
                BranchConfig {
                    regex: Some(RELEASE_REGEX.to_string()),
                    increment: Some(IncrementStrategy::Minor),
                    label: Some("beta".to_string()),
                    deployment_mode: Some(DeploymentMode::ManualDeployment),
                    is_release_branch: Some(true),
                    source_branches: names(&["main", "support"]),
                    pre_release_weight: Some(30000),
                    ..BranchConfig::default()
                },
            ),
            branch(
                "feature",
                short_lived(
                    FEATURE_REGEX,
                    "{BranchName}",
                    DeploymentMode::ManualDeployment,
                    &["develop", "main", "release", "support", "hotfix"],
                ),
            ),
            branch(
                "pull-request",
                BranchConfig {
                    prevent_increment_of_merged_branch: Some(true),
                    ..short_lived(
                        PULL_REQUEST_REGEX,
                        "PullRequest{Number}",
                        DeploymentMode::ContinuousDelivery,
                        &["develop", "main", "release", "feature", "support", "hotfix"],
                    )
                },
            ),
            branch(
                "hotfix",
                BranchConfig {
                    is_release_branch: Some(true),
                    ..short_lived(
                        HOTFIX_REGEX,
                        "beta",
                        DeploymentMode::ManualDeployment,
                        &["main", "support"],
                    )
                },
            ),
            branch(
                "support",
                BranchConfig {
                    regex: Some(SUPPORT_REGEX.to_string()),
                    source_branches: names(&["main"]),
                    deployment_mode: Some(DeploymentMode::ManualDeployment),
                    ..main_branch(DeploymentMode::ManualDeployment)
                },
            ),
            branch(
                "unknown",
                short_lived(
                    UNKNOWN_REGEX,
                    "{BranchName}",
                    DeploymentMode::ManualDeployment,
                    &["main", "develop", "release", "feature", "pull-request", "hotfix", "support"],
                ),
            ),
        ],
        ..Config::default()
    }
}

fn github_flow() -> Config {
    Config {
        workflow: Workflow::GitHubFlow,
        branches: vec![
            branch("main", main_branch(DeploymentMode::ContinuousDelivery)),
            branch(
                "release",
                BranchConfig {
                    regex: Some(RELEASE_REGEX.to_string()),
                    increment: Some(IncrementStrategy::Patch),
                    label: Some("beta".to_string()),
                    deployment_mode: Some(DeploymentMode::ManualDeployment),
                    is_release_branch: Some(true),
                    source_branches: names(&["main"]),
                    pre_release_weight: Some(30000),
                    ..BranchConfig::default()
                },
            ),
            branch(
                "feature",
                short_lived(
                    FEATURE_REGEX,
                    "{BranchName}",
                    DeploymentMode::ManualDeployment,
                    &["main", "release"],
                ),
            ),
            branch(
                "pull-request",
                BranchConfig {
                    prevent_increment_of_merged_branch: Some(true),
                    ..short_lived(
                        PULL_REQUEST_REGEX,
                        "PullRequest{Number}",
                        DeploymentMode::ContinuousDelivery,
                        &["main", "release", "feature"],
                    )
                },
            ),
            branch(
                "unknown",
                short_lived(
                    UNKNOWN_REGEX,
                    "{BranchName}",
                    DeploymentMode::ManualDeployment,
                    &["main", "release", "feature", "pull-request"],
                ),
            ),
        ],
        ..Config::default()
    }
}

/// Mainline and trunk-based presets differ only in the walking strategy
fn trunk(walker: StrategyKind) -> Config {
    let workflow = if walker == StrategyKind::TrunkBased {
        Workflow::TrunkBased
    } else {
        Workflow::Mainline
    };

    Config {
        workflow,
        global: BranchConfig {
            strategies: Some(vec![
                StrategyKind::Fallback,
                StrategyKind::ConfiguredNextVersion,
                StrategyKind::TaggedCommit,
                walker,
            ]),
            ..BranchConfig::default()
        },
        branches: vec![
            branch("main", main_branch(DeploymentMode::ContinuousDeployment)),
            branch(
                "feature",
                short_lived(
                    FEATURE_REGEX,
                    "{BranchName}",
                    DeploymentMode::ContinuousDelivery,
                    &["main"],
                ),
            ),
            branch(
                "hotfix",
                BranchConfig {
                    increment: Some(IncrementStrategy::Patch),
                    ..short_lived(HOTFIX_REGEX, "beta", DeploymentMode::ContinuousDelivery, &["main"])
                },
            ),
            branch(
                "pull-request",
                BranchConfig {
                    prevent_increment_of_merged_branch: Some(true),
                    ..short_lived(
                        PULL_REQUEST_REGEX,
                        "PullRequest{Number}",
                        DeploymentMode::ContinuousDelivery,
                        &["main", "feature", "hotfix"],
                    )
                },
            ),
            branch(
                "unknown",
                short_lived(
                    UNKNOWN_REGEX,
                    "{BranchName}",
                    DeploymentMode::ContinuousDelivery,
                    &["main"],
                ),
            ),
        ],
        ..Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_regex_compiles() {
        for workflow in [
            Workflow::GitFlow,
            Workflow::GitHubFlow,
            Workflow::Mainline,
            Workflow::TrunkBased,
        ] {
            let preset = workflow.preset();
            assert_eq!(preset.workflow, workflow);
            for entry in &preset.branches {
                let regex = entry.settings.regex.as_deref().unwrap();
                assert!(regex::Regex::new(regex).is_ok(), "{:?} / {}", workflow, entry.name);
            }
        }
    }

    #[test]
    fn test_github_flow_main_is_continuous_delivery_without_label() {
        let preset = Workflow::GitHubFlow.preset();
        let main = preset.branch("main").unwrap();
        assert_eq!(main.label.as_deref(), Some(""));
        assert_eq!(main.deployment_mode, Some(DeploymentMode::ContinuousDelivery));
        assert!(preset.branch("develop").is_none());
    }

    #[test]
    fn test_mainline_enables_walker() {
        let preset = Workflow::Mainline.preset();
        let strategies = preset.global.strategies.unwrap();
        assert!(strategies.contains(&StrategyKind::Mainline));
        assert!(!strategies.contains(&StrategyKind::TrunkBased));
    }

    #[test]
    fn test_short_lived_branches_bump_past_tagged_head() {
        let preset = Workflow::GitFlow.preset();
        for name in ["feature", "hotfix", "pull-request", "unknown"] {
            let settings = preset.branch(name).unwrap();
            assert_eq!(settings.prevent_increment_when_current_commit_tagged, Some(false), "{}", name);
        }
        let main = preset.branch("main").unwrap();
        assert_eq!(main.prevent_increment_when_current_commit_tagged, None);
    }

    #[test]
    fn test_pull_request_regex_captures_number() {
        let regex = regex::Regex::new(PULL_REQUEST_REGEX).unwrap();
        let captures = regex.captures("pull/8/merge").unwrap();
        assert_eq!(&captures["Number"], "8");
    }
}
