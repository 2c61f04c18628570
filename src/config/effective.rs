//! Layered configuration resolution
//!
//! Layers, lowest first: hard-coded defaults, the workflow preset's global
//! block, the user's global block, the preset's branch type block, the
//! user's branch type block. A layer only overrides fields it sets.

use super::{
    AssemblyVersioningScheme, BranchConfig, CommitMessageIncrementMode, Config, DeploymentMode,
    IncrementStrategy,
};
use crate::config::workflow::UNKNOWN_REGEX;
use crate::domain::branch::BranchType;
use crate::domain::ignore::IgnoreFilter;
use crate::domain::merge_message::MergeMessageFormats;
use crate::domain::version::{SemanticVersion, SemanticVersionFormat};
use crate::error::{Error, Result};
use crate::strategies::StrategyKind;
use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use std::collections::HashSet;

pub const DEFAULT_TAG_PREFIX: &str = "[vV]?";
pub const DEFAULT_MAJOR_BUMP: &str = r"\+semver:\s?(breaking|major)";
pub const DEFAULT_MINOR_BUMP: &str = r"\+semver:\s?(feature|minor)";
pub const DEFAULT_PATCH_BUMP: &str = r"\+semver:\s?(fix|patch)";
pub const DEFAULT_NO_BUMP: &str = r"\+semver:\s?(none|skip)";
pub const DEFAULT_TAG_PRE_RELEASE_WEIGHT: u64 = 60000;
pub const DEFAULT_COMMIT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Settings that apply regardless of the branch being evaluated
#[derive(Debug, Clone)]
pub struct GlobalSettings {
    pub tag_prefix: Regex,
    pub next_version: Option<SemanticVersion>,
    pub semantic_version_format: SemanticVersionFormat,
    pub major_bump: Regex,
    pub minor_bump: Regex,
    pub patch_bump: Regex,
    pub no_bump: Regex,
    pub commit_message_incrementing: CommitMessageIncrementMode,
    pub conventional_commits: bool,
    pub tag_pre_release_weight: u64,
    pub assembly_versioning_scheme: AssemblyVersioningScheme,
    pub assembly_file_versioning_scheme: AssemblyVersioningScheme,
    pub commit_date_format: String,
    pub merge_message_formats: MergeMessageFormats,
    pub ignore: IgnoreFilter,
}

/// Fully resolved settings of one branch type
#[derive(Debug, Clone)]
pub struct EffectiveBranchConfiguration {
    pub branch_type: BranchType,
    pub regex: Regex,
    pub increment: IncrementStrategy,
    /// Label template; empty means no pre-release label
    pub label: String,
    pub deployment_mode: DeploymentMode,
    pub is_main_branch: bool,
    pub is_release_branch: bool,
    pub source_branches: Vec<BranchType>,
    pub tracks_release_branches: bool,
    pub track_merge_target: bool,
    pub track_merge_message: bool,
    pub prevent_increment_of_merged_branch: bool,
    pub prevent_increment_when_current_commit_tagged: bool,
    pub pre_release_weight: u64,
    pub strategies: Vec<StrategyKind>,
}

impl EffectiveBranchConfiguration {
    /// Whether `name` belongs to this branch type
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Branch-level values used when no layer sets them
fn root_defaults() -> BranchConfig {
    BranchConfig {
        regex: None,
        increment: Some(IncrementStrategy::Patch),
        label: Some("{BranchName}".to_string()),
        deployment_mode: Some(DeploymentMode::ContinuousDelivery),
        is_main_branch: Some(false),
        is_release_branch: Some(false),
        source_branches: Some(Vec::new()),
        tracks_release_branches: Some(false),
        track_merge_target: Some(false),
        track_merge_message: Some(true),
        prevent_increment_of_merged_branch: Some(false),
        prevent_increment_when_current_commit_tagged: Some(true),
        pre_release_weight: Some(0),
        strategies: Some(StrategyKind::DEFAULT.to_vec()),
    }
}

/// Answers "what are the settings for this branch"
///
/// Built once per calculation; every lookup afterwards is infallible.
#[derive(Debug, Clone)]
pub struct ConfigurationResolver {
    global: GlobalSettings,
    /// In classification order, `unknown` last
    types: Vec<EffectiveBranchConfiguration>,
}

impl ConfigurationResolver {
    /// Validate and resolve a user configuration
    ///
    /// # Errors
    /// * invalid regexes or version strings
    /// * a branch type without a regex
    /// * a source branch naming an undeclared type
    /// * an `Inherit` chain that can never reach a concrete increment
    pub fn new(config: &Config) -> Result<Self> {
        let preset = config.workflow.preset();
        let global = Self::resolve_global(config, &preset)?;

        let base = root_defaults()
            .merge(&preset.global)
            .merge(&config.global);

        let mut layered: Vec<(BranchType, BranchConfig)> = Vec::new();
        for entry in preset.branches.iter().chain(config.branches.iter()) {
            let branch_type = BranchType::from_key(&entry.name);
            match layered.iter_mut().find(|(t, _)| *t == branch_type) {
                Some((_, existing)) => *existing = existing.merge(&entry.settings),
                None => layered.push((branch_type, entry.settings.clone())),
            }
        }
        if !layered.iter().any(|(t, _)| *t == BranchType::Unknown) {
            layered.push((BranchType::Unknown, BranchConfig::default()));
        }

        let declared: Vec<BranchType> = layered.iter().map(|(t, _)| t.clone()).collect();
        let mut types = Vec::with_capacity(layered.len());
        for (branch_type, settings) in &layered {
            types.push(Self::finalize(branch_type, &base.merge(settings), &declared)?);
        }
        types.sort_by_key(|t| classification_rank(&t.branch_type, &declared));

        let resolver = ConfigurationResolver { global, types };
        resolver.check_inherit_chains()?;
        Ok(resolver)
    }

    fn resolve_global(config: &Config, preset: &Config) -> Result<GlobalSettings> {
        let text = |user: &Option<String>, preset: &Option<String>, default: &str| {
            user.clone()
                .or_else(|| preset.clone())
                .unwrap_or_else(|| default.to_string())
        };

        let semantic_version_format = config
            .semantic_version_format
            .or(preset.semantic_version_format)
            .unwrap_or_default();

        let next_version = match config.next_version.as_ref().or(preset.next_version.as_ref()) {
            Some(raw) if !raw.trim().is_empty() => Some(
                SemanticVersion::parse(raw.trim(), SemanticVersionFormat::Loose)
                    .map_err(|e| Error::config(format!("Invalid next_version: {}", e)))?,
            ),
            _ => None,
        };

        let tag_prefix = text(&config.tag_prefix, &preset.tag_prefix, DEFAULT_TAG_PREFIX);

        let commit_date_format = text(
            &config.commit_date_format,
            &preset.commit_date_format,
            DEFAULT_COMMIT_DATE_FORMAT,
        );
        if StrftimeItems::new(&commit_date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::config(format!(
                "Invalid commit_date_format '{}'",
                commit_date_format
            )));
        }

        Ok(GlobalSettings {
            tag_prefix: Error::compile(&format!("^(?:{})", tag_prefix))?,
            next_version,
            semantic_version_format,
            major_bump: Error::compile(&text(
                &config.major_version_bump_message,
                &preset.major_version_bump_message,
                DEFAULT_MAJOR_BUMP,
            ))?,
            minor_bump: Error::compile(&text(
                &config.minor_version_bump_message,
                &preset.minor_version_bump_message,
                DEFAULT_MINOR_BUMP,
            ))?,
            patch_bump: Error::compile(&text(
                &config.patch_version_bump_message,
                &preset.patch_version_bump_message,
                DEFAULT_PATCH_BUMP,
            ))?,
            no_bump: Error::compile(&text(
                &config.no_bump_message,
                &preset.no_bump_message,
                DEFAULT_NO_BUMP,
            ))?,
            commit_message_incrementing: config
                .commit_message_incrementing
                .or(preset.commit_message_incrementing)
                .unwrap_or_default(),
            conventional_commits: config
                .conventional_commits
                .or(preset.conventional_commits)
                .unwrap_or(false),
            tag_pre_release_weight: config
                .tag_pre_release_weight
                .or(preset.tag_pre_release_weight)
                .unwrap_or(DEFAULT_TAG_PRE_RELEASE_WEIGHT),
            assembly_versioning_scheme: config
                .assembly_versioning_scheme
                .or(preset.assembly_versioning_scheme)
                .unwrap_or_default(),
            assembly_file_versioning_scheme: config
                .assembly_file_versioning_scheme
                .or(preset.assembly_file_versioning_scheme)
                .unwrap_or(AssemblyVersioningScheme::MajorMinorPatchTag),
            commit_date_format,
            merge_message_formats: MergeMessageFormats::new(&config.merge_message_formats)?,
            ignore: IgnoreFilter::new(&config.ignore)?,
        })
    }

    fn finalize(
        branch_type: &BranchType,
        settings: &BranchConfig,
        declared: &[BranchType],
    ) -> Result<EffectiveBranchConfiguration> {
        let regex = match (&settings.regex, branch_type) {
            (Some(pattern), _) => Error::compile(pattern)?,
            (None, BranchType::Unknown) => Error::compile(UNKNOWN_REGEX)?,
            (None, _) => {
                return Err(Error::config(format!(
                    "Branch type '{}' has no regex",
                    branch_type
                )))
            }
        };

        let mut source_branches = Vec::new();
        for name in settings.source_branches.iter().flatten() {
            let source = BranchType::from_key(name);
            if !declared.contains(&source) {
                return Err(Error::config(format!(
                    "Branch type '{}' lists unknown source branch '{}'",
                    branch_type, name
                )));
            }
            source_branches.push(source);
        }

        Ok(EffectiveBranchConfiguration {
            branch_type: branch_type.clone(),
            regex,
            increment: settings.increment.unwrap_or(IncrementStrategy::Patch),
            label: settings.label.clone().unwrap_or_default(),
            deployment_mode: settings
                .deployment_mode
                .unwrap_or(DeploymentMode::ContinuousDelivery),
            is_main_branch: settings.is_main_branch.unwrap_or(false),
            is_release_branch: settings.is_release_branch.unwrap_or(false),
            source_branches,
            tracks_release_branches: settings.tracks_release_branches.unwrap_or(false),
            track_merge_target: settings.track_merge_target.unwrap_or(false),
            track_merge_message: settings.track_merge_message.unwrap_or(true),
            prevent_increment_of_merged_branch: settings
                .prevent_increment_of_merged_branch
                .unwrap_or(false),
            prevent_increment_when_current_commit_tagged: settings
                .prevent_increment_when_current_commit_tagged
                .unwrap_or(true),
            pre_release_weight: settings.pre_release_weight.unwrap_or(0),
            strategies: settings.strategies.clone().unwrap_or_default(),
        })
    }

    /// Reject `Inherit` types whose every source path loops back into
    /// `Inherit` types without ever reaching a concrete increment.
    fn check_inherit_chains(&self) -> Result<()> {
        for config in &self.types {
            if config.increment != IncrementStrategy::Inherit {
                continue;
            }

            let mut visited = HashSet::new();
            let mut pending = vec![config];
            let mut terminates = false;
            while let Some(current) = pending.pop() {
                if !visited.insert(current.branch_type.clone()) {
                    continue;
                }
                if current.increment != IncrementStrategy::Inherit
                    || current.source_branches.is_empty()
                {
                    terminates = true;
                    break;
                }
                for source in &current.source_branches {
                    if let Some(next) = self.for_type(source) {
                        pending.push(next);
                    }
                }
            }

            if !terminates {
                return Err(Error::config(format!(
                    "Branch type '{}' inherits its increment in a cycle",
                    config.branch_type
                )));
            }
        }
        Ok(())
    }

    pub fn global(&self) -> &GlobalSettings {
        &self.global
    }

    /// Branch types in the order names are matched against them
    pub fn classification_order(&self) -> impl Iterator<Item = &BranchType> {
        self.types.iter().map(|t| &t.branch_type)
    }

    pub fn for_type(&self, branch_type: &BranchType) -> Option<&EffectiveBranchConfiguration> {
        self.types.iter().find(|t| &t.branch_type == branch_type)
    }

    /// Settings for a branch name; names matching no type resolve to `unknown`
    pub fn resolve(&self, branch_name: &str) -> &EffectiveBranchConfiguration {
        let unknown = self.types.len() - 1;
        self.types[..unknown]
            .iter()
            .find(|t| t.matches(branch_name))
            .unwrap_or(&self.types[unknown])
    }

    /// Branch type of a name
    pub fn classify(&self, branch_name: &str) -> BranchType {
        self.resolve(branch_name).branch_type.clone()
    }
}

/// Built-ins in fixed order, then custom types as declared, then unknown
fn classification_rank(branch_type: &BranchType, declared: &[BranchType]) -> usize {
    let built_in = BranchType::BUILT_IN.len();
    match branch_type {
        BranchType::Unknown => usize::MAX,
        BranchType::Custom(_) => {
            built_in + declared.iter().position(|t| t == branch_type).unwrap_or(0)
        }
        other => BranchType::BUILT_IN
            .iter()
            .position(|t| t == other)
            .unwrap_or(built_in),
    }
}
