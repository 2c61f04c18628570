//! User interface module - output selection and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Choosing what to render

use anyhow::{anyhow, Result};
use clap::ValueEnum;

use crate::format::VersionVariables;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_branch_types, display_error, display_status, format_json, format_key_value,
    format_table,
};

/// Shape of the calculated variables on stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `Key=value` lines, easy to source from a shell
    #[default]
    KeyValue,
    /// Human readable table
    Table,
    Json,
}

/// Render the variables in the requested format.
///
/// # Arguments
/// * `variables` - Calculated variables
/// * `format` - Output format
/// * `show_variable` - Print only this variable's value (any format)
///
/// # Returns
/// * `Ok(String)` - Text to print
/// * `Err` - If the variable does not exist or serialization fails
pub fn render(
    variables: &VersionVariables,
    format: OutputFormat,
    show_variable: Option<&str>,
) -> Result<String> {
    if let Some(wanted) = show_variable {
        return variables
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| format!("{}\n", value))
            .ok_or_else(|| anyhow!("Unknown variable '{}'", wanted));
    }

    Ok(match format {
        OutputFormat::KeyValue => format_key_value(variables),
        OutputFormat::Table => format_table(variables),
        OutputFormat::Json => format!("{}\n", format_json(variables)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{CalculationRequest, VersionCalculator};
    use crate::config::Config;
    use crate::git::RepositoryFixture;

    fn variables() -> VersionVariables {
        let mut fixture = RepositoryFixture::new();
        fixture.commit("initial");
        fixture.branch("develop");
        fixture.commit("work");
        let graph = fixture.snapshot();
        VersionCalculator::new(&Config::default())
            .unwrap()
            .calculate(&graph, &CalculationRequest::head())
            .unwrap()
    }

    #[test]
    fn test_show_variable_is_case_insensitive() {
        let vars = variables();
        let out = render(&vars, OutputFormat::Json, Some("semver")).unwrap();
        assert_eq!(out, format!("{}\n", vars.sem_ver));
    }

    #[test]
    fn test_unknown_variable_is_an_error() {
        let err = render(&variables(), OutputFormat::KeyValue, Some("Nope")).unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn test_json_output_ends_with_newline() {
        let out = render(&variables(), OutputFormat::Json, None).unwrap();
        assert!(out.starts_with('{'));
        assert!(out.ends_with("}\n"));
    }
}
