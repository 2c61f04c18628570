use crate::domain::branch::{escape_branch_name, BranchType};
use crate::domain::commit::CommitId;
use crate::environment::Environment;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Legacy spelling of `{BranchName}`
const USE_BRANCH_NAME: &str = "useBranchName";

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("static placeholder regex"))
}

fn env_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^env:(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*(?:\?\?\s*(?P<default>.*))?$")
            .expect("static env placeholder regex")
    })
}

/// Expand a label template for a branch
///
/// Supported placeholders:
/// - `{BranchName}`: the `BranchName` capture of the branch type regex, or
///   the whole name, escaped
/// - `{Sha}`: short id of HEAD
/// - `{env:NAME}` / `{env:NAME ?? default}`: environment lookup
/// - any other named capture of the branch type regex, escaped;
///   `{Number}` is zero-padded to four digits on pull-request branches
///
/// Placeholders that cannot be resolved expand to nothing.
pub fn format_label(
    template: &str,
    regex: &Regex,
    branch_name: &str,
    branch_type: &BranchType,
    sha: &CommitId,
    environment: &dyn Environment,
) -> String {
    let template = if template == USE_BRANCH_NAME {
        "{BranchName}"
    } else {
        template
    };
    if !template.contains('{') {
        return template.to_string();
    }

    let captures = regex.captures(branch_name);
    let capture = |name: &str| {
        captures
            .as_ref()
            .and_then(|c| c.name(name))
            .map(|m| m.as_str())
    };

    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let key = caps[1].trim();

            if let Some(env) = env_regex().captures(key) {
                return environment
                    .var(&env["name"])
                    .or_else(|| env.name("default").map(|d| unquote(d.as_str()).to_string()))
                    .unwrap_or_default();
            }

            match key {
                "BranchName" => escape_branch_name(capture("BranchName").unwrap_or(branch_name)),
                "Sha" => sha.short().to_string(),
                "Number" if branch_type == &BranchType::PullRequest => {
                    let number = capture("Number").unwrap_or_default();
                    match number.parse::<u64>() {
                        Ok(n) => format!("{:04}", n),
                        Err(_) => escape_branch_name(number),
                    }
                }
                other => capture(other).map(escape_branch_name).unwrap_or_default(),
            }
        })
        .into_owned()
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
