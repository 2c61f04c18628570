//! Pure formatting functions for UI output.
//!
//! The `format_*` functions build strings and are testable; the `display_*`
//! functions print. Diagnostics go to stderr so stdout only ever carries
//! the requested output.

use crate::format::VersionVariables;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

/// `Key=value` lines, one per variable
pub fn format_key_value(variables: &VersionVariables) -> String {
    variables
        .iter()
        .map(|(name, value)| format!("{}={}\n", name, value))
        .collect()
}

/// Aligned two-column table with the headline version on top
pub fn format_table(variables: &VersionVariables) -> String {
    let width = variables
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    let mut out = format!(
        "\n{} {}\n\n",
        style("Version").bold(),
        style(&variables.full_sem_ver).green()
    );
    for (name, value) in variables.iter() {
        let value = if value.is_empty() {
            style("-".to_string()).dim()
        } else {
            style(value)
        };
        out.push_str(&format!(
            "  {}  {}\n",
            style(format!("{:<width$}", name, width = width)).cyan(),
            value
        ));
    }
    out
}

/// Pretty-printed JSON object with PascalCase keys
pub fn format_json(variables: &VersionVariables) -> serde_json::Result<String> {
    serde_json::to_string_pretty(variables)
}

/// Display branch types in the order names are matched against them.
///
/// # Arguments
/// * `types` - Type key and regex pairs
pub fn display_branch_types(types: &[(String, String)]) {
    println!("{}", style("Branch types (matched in order):").bold());
    for (name, regex) in types {
        println!("  - {:<14} {}", name, style(regex).dim());
    }
}
