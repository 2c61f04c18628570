//! Domain logic - pure versioning rules independent of any repository backend

pub mod branch;
pub mod commit;
pub mod ignore;
pub mod merge_message;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use branch::{escape_branch_name, Branch, BranchType};
pub use commit::{Commit, CommitId, ParsedCommit};
pub use ignore::IgnoreFilter;
pub use merge_message::{MergeMessage, MergeMessageFormats};
pub use prerelease::PreReleaseTag;
pub use tag::{Tag, VersionTag};
pub use version::{SemanticVersion, SemanticVersionFormat, VersionField};
