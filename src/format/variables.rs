use crate::config::AssemblyVersioningScheme;
use crate::domain::branch::escape_branch_name;
use crate::domain::commit::{Commit, CommitId};
use crate::domain::version::SemanticVersion;
use serde::Serialize;

/// Everything [VersionVariables::project] needs
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    pub version: &'a SemanticVersion,
    pub branch_name: &'a str,
    pub head: &'a Commit,
    pub version_source: Option<&'a CommitId>,
    pub commits_since_version_source: u64,
    pub weighted_pre_release_number: u64,
    /// Validated chrono strftime format
    pub commit_date_format: &'a str,
    pub assembly_versioning_scheme: AssemblyVersioningScheme,
    pub assembly_file_versioning_scheme: AssemblyVersioningScheme,
}

/// The result of a calculation, in every shape build tooling asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionVariables {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release_tag: String,
    pub pre_release_tag_with_dash: String,
    pub pre_release_label: String,
    pub pre_release_label_with_dash: String,
    pub pre_release_number: Option<u64>,
    pub weighted_pre_release_number: u64,
    pub build_meta_data: Option<u64>,
    pub full_build_meta_data: String,
    pub major_minor_patch: String,
    pub sem_ver: String,
    pub full_sem_ver: String,
    pub informational_version: String,
    pub branch_name: String,
    pub escaped_branch_name: String,
    pub sha: String,
    pub short_sha: String,
    pub version_source_sha: Option<String>,
    pub commits_since_version_source: u64,
    pub commit_date: String,
    pub assembly_sem_ver: String,
    pub assembly_sem_file_ver: String,
}

impl VersionVariables {
    pub fn project(input: &Projection<'_>) -> Self {
        let version = input.version;
        let pre_release_tag = version.pre_release.to_string();
        let pre_release_label = version.pre_release.label().to_string();
        let escaped_branch_name = escape_branch_name(input.branch_name);

        let sem_ver = SemanticVersion {
            build_metadata: None,
            ..version.clone()
        }
        .to_string();
        let full_build_meta_data = format!(
            "{}.Branch.{}.Sha.{}",
            input.commits_since_version_source,
            escaped_branch_name,
            input.head.id
        );

        VersionVariables {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
            pre_release_tag_with_dash: with_dash(&pre_release_tag),
            pre_release_tag,
            pre_release_label_with_dash: with_dash(&pre_release_label),
            pre_release_label,
            pre_release_number: version.pre_release.number,
            weighted_pre_release_number: input.weighted_pre_release_number,
            build_meta_data: version.build_metadata,
            informational_version: format!("{}+{}", sem_ver, full_build_meta_data),
            full_build_meta_data,
            major_minor_patch: version.major_minor_patch(),
            full_sem_ver: version.to_string(),
            sem_ver,
            branch_name: input.branch_name.to_string(),
            escaped_branch_name,
            sha: input.head.id.to_string(),
            short_sha: input.head.id.short().to_string(),
            version_source_sha: input.version_source.map(|id| id.to_string()),
            commits_since_version_source: input.commits_since_version_source,
            commit_date: input
                .head
                .committer_time
                .format(input.commit_date_format)
                .to_string(),
            assembly_sem_ver: assembly_version(version, input.assembly_versioning_scheme),
            assembly_sem_file_ver: assembly_version(version, input.assembly_file_versioning_scheme),
        }
    }

    /// Variable names and values in declaration order; absent values are
    /// empty strings
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, String)> {
        let optional = |value: Option<u64>| value.map(|v| v.to_string()).unwrap_or_default();

        vec![
            ("Major", self.major.to_string()),
            ("Minor", self.minor.to_string()),
            ("Patch", self.patch.to_string()),
            ("PreReleaseTag", self.pre_release_tag.clone()),
            ("PreReleaseTagWithDash", self.pre_release_tag_with_dash.clone()),
            ("PreReleaseLabel", self.pre_release_label.clone()),
            ("PreReleaseLabelWithDash", self.pre_release_label_with_dash.clone()),
            ("PreReleaseNumber", optional(self.pre_release_number)),
            ("WeightedPreReleaseNumber", self.weighted_pre_release_number.to_string()),
            ("BuildMetaData", optional(self.build_meta_data)),
            ("FullBuildMetaData", self.full_build_meta_data.clone()),
            ("MajorMinorPatch", self.major_minor_patch.clone()),
            ("SemVer", self.sem_ver.clone()),
            ("FullSemVer", self.full_sem_ver.clone()),
            ("InformationalVersion", self.informational_version.clone()),
            ("BranchName", self.branch_name.clone()),
            ("EscapedBranchName", self.escaped_branch_name.clone()),
            ("Sha", self.sha.clone()),
            ("ShortSha", self.short_sha.clone()),
            ("VersionSourceSha", self.version_source_sha.clone().unwrap_or_default()),
            ("CommitsSinceVersionSource", self.commits_since_version_source.to_string()),
            ("CommitDate", self.commit_date.clone()),
            ("AssemblySemVer", self.assembly_sem_ver.clone()),
            ("AssemblySemFileVer", self.assembly_sem_file_ver.clone()),
        ]
        .into_iter()
    }
}

fn with_dash(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("-{}", value)
    }
}

fn assembly_version(version: &SemanticVersion, scheme: AssemblyVersioningScheme) -> String {
    let (major, minor, patch) = (version.major, version.minor, version.patch);
    match scheme {
        AssemblyVersioningScheme::MajorMinorPatchTag => format!(
            "{}.{}.{}.{}",
            major,
            minor,
            patch,
            version.pre_release.number.unwrap_or(0)
        ),
        AssemblyVersioningScheme::MajorMinorPatch => format!("{}.{}.{}.0", major, minor, patch),
        AssemblyVersioningScheme::MajorMinor => format!("{}.{}.0.0", major, minor),
        AssemblyVersioningScheme::Major => format!("{}.0.0.0", major),
        AssemblyVersioningScheme::None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prerelease::PreReleaseTag;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn head() -> Commit {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap();
        Commit {
            id: CommitId::new("abcdef0123456789abcdef0123456789abcdef01"),
            parents: Vec::new(),
            author_time: time,
            committer_time: time,
            message: "initial".to_string(),
            paths: Vec::new(),
        }
    }

    fn project(version: &SemanticVersion, head: &Commit) -> VersionVariables {
        VersionVariables::project(&Projection {
            version,
            branch_name: "release/2.0.0",
            head,
            version_source: None,
            commits_since_version_source: 3,
            weighted_pre_release_number: 30001,
            commit_date_format: "%Y-%m-%d",
            assembly_versioning_scheme: AssemblyVersioningScheme::MajorMinorPatch,
            assembly_file_versioning_scheme: AssemblyVersioningScheme::MajorMinorPatchTag,
        })
    }

    #[test]
    fn test_manual_deployment_projection() {
        let head = head();
        let mut version = SemanticVersion::new(2, 0, 0).with_pre_release(PreReleaseTag::new("beta", Some(1)));
        version.build_metadata = Some(3);
        let vars = project(&version, &head);

        assert_eq!(vars.sem_ver, "2.0.0-beta.1");
        assert_eq!(vars.full_sem_ver, "2.0.0-beta.1+3");
        assert_eq!(vars.pre_release_tag_with_dash, "-beta.1");
        assert_eq!(vars.pre_release_label_with_dash, "-beta");
        assert_eq!(vars.escaped_branch_name, "release-2-0-0");
        assert_eq!(
            vars.full_build_meta_data,
            "3.Branch.release-2-0-0.Sha.abcdef0123456789abcdef0123456789abcdef01"
        );
        assert_eq!(
            vars.informational_version,
            "2.0.0-beta.1+3.Branch.release-2-0-0.Sha.abcdef0123456789abcdef0123456789abcdef01"
        );
        assert_eq!(vars.short_sha, "abcdef0");
        assert_eq!(vars.commit_date, "2024-03-09");
        assert_eq!(vars.assembly_sem_ver, "2.0.0.0");
        assert_eq!(vars.assembly_sem_file_ver, "2.0.0.1");
    }

    #[test]
    fn test_release_projection_has_empty_pre_release_fields() {
        let head = head();
        let vars = project(&SemanticVersion::new(1, 2, 3), &head);
        assert_eq!(vars.pre_release_tag, "");
        assert_eq!(vars.pre_release_tag_with_dash, "");
        assert_eq!(vars.pre_release_number, None);
        assert_eq!(vars.sem_ver, "1.2.3");
    }

    #[test]
    fn test_json_uses_pascal_case_names() {
        let head = head();
        let vars = project(&SemanticVersion::new(1, 2, 3), &head);
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json["FullSemVer"], "1.2.3");
        assert_eq!(json["AssemblySemFileVer"], "1.2.3.0");
        assert_eq!(json["CommitsSinceVersionSource"], 3);
    }

    #[test]
    fn test_iter_covers_every_variable() {
        let head = head();
        let vars = project(&SemanticVersion::new(1, 2, 3), &head);
        let names: Vec<&str> = vars.iter().map(|(name, _)| name).collect();
        assert_eq!(names.len(), 24);
        let json = serde_json::to_value(&vars).unwrap();
        for name in names {
            assert!(json.get(name).is_some(), "{} missing from JSON", name);
        }
    }

    #[test]
    fn test_assembly_schemes() {
        let version = SemanticVersion::new(3, 4, 5).with_pre_release(PreReleaseTag::new("rc", Some(2)));
        assert_eq!(assembly_version(&version, AssemblyVersioningScheme::MajorMinorPatchTag), "3.4.5.2");
        assert_eq!(assembly_version(&version, AssemblyVersioningScheme::MajorMinor), "3.4.0.0");
        assert_eq!(assembly_version(&version, AssemblyVersioningScheme::Major), "3.0.0.0");
        assert_eq!(assembly_version(&version, AssemblyVersioningScheme::None), "");
    }
}
