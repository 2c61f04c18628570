//! Turning the selected base version into output
//!
//! - [label]: pre-release label templates
//! - [numbering]: pre-release number and build metadata per deployment mode
//! - [variables]: the final [variables::VersionVariables] projection

pub mod label;
pub mod numbering;
pub mod variables;

pub use label::format_label;
pub use variables::VersionVariables;
