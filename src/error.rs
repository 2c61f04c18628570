use thiserror::Error;

/// Unified error type for branchver operations
#[derive(Error, Debug)]
pub enum Error {
    /// The evaluated branch or commit does not exist in the snapshot
    #[error("No commits found on branch '{branch}'")]
    NoCommitsFound { branch: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in branchver
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        Error::Version(msg.into())
    }

    pub fn no_commits(branch: impl Into<String>) -> Self {
        Error::NoCommitsFound {
            branch: branch.into(),
        }
    }

    /// Compile a regex, mapping failures to [`Error::InvalidRegex`]
    pub fn compile(pattern: &str) -> Result<regex::Regex> {
        regex::Regex::new(pattern).map_err(|source| Error::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_no_commits_display_names_branch() {
        let err = Error::no_commits("feature/foo");
        assert_eq!(err.to_string(), "No commits found on branch 'feature/foo'");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_compile_reports_pattern() {
        let err = Error::compile("(unclosed").unwrap_err();
        match err {
            Error::InvalidRegex { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(Error::compile("^main$").is_ok());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (Error::config("x"), "Configuration error"),
            (Error::version("x"), "Version parsing error"),
            (Error::no_commits("x"), "No commits found"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
