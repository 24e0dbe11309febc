//! Branch and commit message resolution for patch outcomes.

use std::sync::LazyLock;

use regex::Regex;

const MAX_BRANCH_LEN: usize = 100;

static BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").unwrap());

/// Deterministic branch name used when the model omits one or proposes an unsafe one.
pub fn default_branch(issue_number: u64) -> String {
    format!("autopatch/issue-{issue_number}")
}

pub fn default_commit_message(issue_number: u64) -> String {
    format!("fix: resolve issue #{issue_number}")
}

/// Use the proposed branch when it is a safe ref name, else the default.
pub fn resolve_branch(proposed: Option<&str>, issue_number: u64) -> String {
    proposed
        .map(str::trim)
        .filter(|name| is_safe_branch(name))
        .map_or_else(|| default_branch(issue_number), str::to_string)
}

pub fn resolve_commit_message(proposed: Option<&str>, issue_number: u64) -> String {
    proposed
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map_or_else(|| default_commit_message(issue_number), str::to_string)
}

/// Conservative subset of git's ref-format rules.
pub fn is_safe_branch(name: &str) -> bool {
    name.len() <= MAX_BRANCH_LEN
        && BRANCH_RE.is_match(name)
        && !name.contains("..")
        && !name.contains("//")
        && !name.ends_with('/')
        && !name.ends_with('.')
        && !name.ends_with(".lock")
        && !name.split('/').any(|part| part.starts_with('.'))
}
