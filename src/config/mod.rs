//! Configuration model
//!
//! The raw [`Config`] is what users write (TOML). Every field is optional so
//! that layers can be merged: hard-coded defaults, then the selected
//! [`Workflow`] preset, then the user's global block, then per-branch-type
//! blocks. [`effective::ConfigurationResolver`] performs the merge.

pub mod effective;
pub mod workflow;

pub use effective::{ConfigurationResolver, EffectiveBranchConfiguration, GlobalSettings};
pub use workflow::Workflow;

use crate::domain::version::SemanticVersionFormat;
use crate::error::Result;
use crate::strategies::StrategyKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up by [`load_config`]
pub const CONFIG_FILE_NAME: &str = "branchver.toml";

/// How a branch type bumps the version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncrementStrategy {
    None,
    Patch,
    Minor,
    Major,
    /// Use the increment of the branch this one was created from
    Inherit,
}

/// How pre-release numbers and build metadata are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentMode {
    /// `1.2.3-beta.1+4`: tag-based counter, commits as build metadata
    ManualDeployment,
    /// `1.2.3-beta.4`: commits since the version source as counter
    ContinuousDelivery,
    /// `1.2.3`: pre-release dropped
    ContinuousDeployment,
}

/// Which commit messages may carry bump directives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitMessageIncrementMode {
    #[default]
    Enabled,
    Disabled,
    MergeMessageOnly,
}

/// Shape of the four-part assembly versions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssemblyVersioningScheme {
    MajorMinorPatchTag,
    #[default]
    MajorMinorPatch,
    MajorMinor,
    Major,
    None,
}

/// Commits to leave out of every calculation
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct IgnoreConfig {
    /// Commits with an earlier committer time are ignored
    #[serde(default)]
    pub before: Option<DateTime<Utc>>,

    /// Commit ids (or unique prefixes) to ignore
    #[serde(default)]
    pub shas: Vec<String>,

    /// Globs; a commit touching only matching paths is ignored
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Branch-level settings, shared by the global block and each branch type
///
/// `None` means "inherit from the layer below"; `Some` (including an empty
/// string or list) overrides it.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct BranchConfig {
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub increment: Option<IncrementStrategy>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub deployment_mode: Option<DeploymentMode>,
    #[serde(default)]
    pub is_main_branch: Option<bool>,
    #[serde(default)]
    pub is_release_branch: Option<bool>,
    #[serde(default)]
    pub source_branches: Option<Vec<String>>,
    #[serde(default)]
    pub tracks_release_branches: Option<bool>,
    #[serde(default)]
    pub track_merge_target: Option<bool>,
    #[serde(default)]
    pub track_merge_message: Option<bool>,
    #[serde(default)]
    pub prevent_increment_of_merged_branch: Option<bool>,
    #[serde(default)]
    pub prevent_increment_when_current_commit_tagged: Option<bool>,
    #[serde(default)]
    pub pre_release_weight: Option<u64>,
    #[serde(default)]
    pub strategies: Option<Vec<StrategyKind>>,
}

impl BranchConfig {
    /// Layer `over` on top of `self`
    pub fn merge(&self, over: &BranchConfig) -> BranchConfig {
        BranchConfig {
            regex: over.regex.clone().or_else(|| self.regex.clone()),
            increment: over.increment.or(self.increment),
            label: over.label.clone().or_else(|| self.label.clone()),
            deployment_mode: over.deployment_mode.or(self.deployment_mode),
            is_main_branch: over.is_main_branch.or(self.is_main_branch),
            is_release_branch: over.is_release_branch.or(self.is_release_branch),
            source_branches: over
                .source_branches
                .clone()
                .or_else(|| self.source_branches.clone()),
            tracks_release_branches: over.tracks_release_branches.or(self.tracks_release_branches),
            track_merge_target: over.track_merge_target.or(self.track_merge_target),
            track_merge_message: over.track_merge_message.or(self.track_merge_message),
            prevent_increment_of_merged_branch: over
                .prevent_increment_of_merged_branch
                .or(self.prevent_increment_of_merged_branch),
            prevent_increment_when_current_commit_tagged: over
                .prevent_increment_when_current_commit_tagged
                .or(self.prevent_increment_when_current_commit_tagged),
            pre_release_weight: over.pre_release_weight.or(self.pre_release_weight),
            strategies: over.strategies.clone().or_else(|| self.strategies.clone()),
        }
    }
}

/// A branch type block: `[[branches]]` with a `name`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchTypeConfig {
    /// Type key: `main`, `develop`, `release`, `feature`, `hotfix`,
    /// `support`, `pull-request`, `unknown`, or any custom name
    pub name: String,

    #[serde(flatten)]
    pub settings: BranchConfig,
}

impl BranchTypeConfig {
    pub fn new(name: impl Into<String>, settings: BranchConfig) -> Self {
        BranchTypeConfig {
            name: name.into(),
            settings,
        }
    }
}

/// Represents the complete configuration for branchver.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Preset providing the defaults every other field overrides
    #[serde(default)]
    pub workflow: Workflow,

    /// Regex matched (and stripped) at the start of tag names
    #[serde(default)]
    pub tag_prefix: Option<String>,

    /// Floor for the calculated version
    #[serde(default)]
    pub next_version: Option<String>,

    #[serde(default)]
    pub semantic_version_format: Option<SemanticVersionFormat>,

    #[serde(default)]
    pub major_version_bump_message: Option<String>,
    #[serde(default)]
    pub minor_version_bump_message: Option<String>,
    #[serde(default)]
    pub patch_version_bump_message: Option<String>,
    #[serde(default)]
    pub no_bump_message: Option<String>,

    #[serde(default)]
    pub commit_message_incrementing: Option<CommitMessageIncrementMode>,

    /// Also derive bumps from Conventional Commit headers
    #[serde(default)]
    pub conventional_commits: Option<bool>,

    /// Weight used for versions without a pre-release tag
    #[serde(default)]
    pub tag_pre_release_weight: Option<u64>,

    #[serde(default)]
    pub assembly_versioning_scheme: Option<AssemblyVersioningScheme>,
    #[serde(default)]
    pub assembly_file_versioning_scheme: Option<AssemblyVersioningScheme>,

    /// chrono strftime format for `CommitDate`
    #[serde(default)]
    pub commit_date_format: Option<String>,

    /// Extra merge message formats, name to regex with a `SourceBranch` group
    #[serde(default)]
    pub merge_message_formats: BTreeMap<String, String>,

    #[serde(default)]
    pub ignore: IgnoreConfig,

    /// Branch-level settings applied to every branch type
    #[serde(default)]
    pub global: BranchConfig,

    /// Branch types; custom types are matched in the order listed
    #[serde(default)]
    pub branches: Vec<BranchTypeConfig>,
}

impl Config {
    /// Configuration of a preset workflow with no overrides
    pub fn for_workflow(workflow: Workflow) -> Self {
        Config {
            workflow,
            ..Config::default()
        }
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Settings block for a branch type, if the user declared one
    pub fn branch(&self, name: &str) -> Option<&BranchConfig> {
        self.branches
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.settings)
    }

    /// Add or replace the block of a branch type
    pub fn with_branch(mut self, name: &str, settings: BranchConfig) -> Self {
        match self.branches.iter_mut().find(|b| b.name == name) {
            Some(existing) => existing.settings = settings,
            None => self.branches.push(BranchTypeConfig::new(name, settings)),
        }
        self
    }
}

/// Locate the configuration file
///
/// Order:
/// 1. Custom path provided as parameter
/// 2. `branchver.toml` in the given working directory
/// 3. `branchver.toml` in the user config directory
pub fn find_config_file(config_path: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(path.to_path_buf());
    }

    let local = working_dir.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

/// Loads configuration from file or returns defaults.
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, working_dir: &Path) -> Result<Config> {
    match find_config_file(config_path, working_dir) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            let content = fs::read_to_string(&path)?;
            Config::from_toml(&content)
        }
        None => Ok(Config::default()),
    }
}
