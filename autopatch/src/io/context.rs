//! Context collection: bounded, immutable snapshots of the issue or pull request.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::error::PreconditionError;
use crate::io::listing::list_files;

/// Issue fields supplied by the invoking workflow.
#[derive(Debug, Clone)]
pub struct IssueInput {
    pub number: u64,
    pub title: String,
    pub body: String,
}

impl IssueInput {
    /// An issue with neither title nor body gives the model nothing to act on.
    pub fn validate(&self) -> Result<(), PreconditionError> {
        if self.title.trim().is_empty() && self.body.trim().is_empty() {
            return Err(PreconditionError::EmptyIssue(self.number));
        }
        Ok(())
    }
}

/// Snapshot rendered into the issue prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueSnapshot {
    pub issue_number: u64,
    pub title: String,
    pub body: String,
    pub file_list: Vec<String>,
}

/// Build the issue snapshot. Reads the directory tree only, never file contents.
pub fn collect_issue(root: &Path, input: &IssueInput, max_files: usize) -> Result<IssueSnapshot> {
    input.validate()?;
    let file_list = list_files(root, max_files);
    debug!(issue = input.number, files = file_list.len(), "collected issue context");
    Ok(IssueSnapshot {
        issue_number: input.number,
        title: input.title.clone(),
        body: input.body.clone(),
        file_list,
    })
}

/// Where the pull-request diff comes from.
#[derive(Debug, Clone)]
pub enum DiffSource {
    Inline(String),
    File(PathBuf),
    Missing,
}

impl DiffSource {
    /// Prefer a diff file over inline text; blank inline text counts as missing.
    pub fn from_options(inline: Option<String>, file: Option<PathBuf>) -> Self {
        match (file, inline) {
            (Some(path), _) => Self::File(path),
            (None, Some(text)) if !text.trim().is_empty() => Self::Inline(text),
            _ => Self::Missing,
        }
    }

    /// Load the diff text. `Ok(None)` means there is nothing to review.
    pub fn load(self) -> Result<Option<String>, PreconditionError> {
        let text = match self {
            Self::Inline(text) => text,
            Self::File(path) => {
                fs::read_to_string(&path).map_err(|err| PreconditionError::DiffFile {
                    message: err.to_string(),
                    path,
                })?
            }
            Self::Missing => return Ok(None),
        };
        Ok((!text.trim().is_empty()).then_some(text))
    }
}

/// Pull-request fields supplied by the invoking workflow.
#[derive(Debug, Clone)]
pub struct PullRequestInput {
    pub number: u64,
    pub title: String,
    pub body: String,
}

/// Snapshot rendered into the review prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSnapshot {
    pub pr_number: u64,
    pub title: String,
    pub body: String,
    /// At most `max_diff_chars` characters of the diff.
    pub diff_text: String,
    pub diff_truncated: bool,
}

/// Build the review snapshot, truncating the diff by character count.
pub fn collect_review(input: &PullRequestInput, diff: &str, max_diff_chars: usize) -> ReviewSnapshot {
    let (diff_text, diff_truncated) = truncate_chars(diff, max_diff_chars);
    debug!(
        pr = input.number,
        diff_chars = diff_text.chars().count(),
        diff_truncated,
        "collected review context"
    );
    ReviewSnapshot {
        pr_number: input.number,
        title: input.title.clone(),
        body: input.body.clone(),
        diff_text,
        diff_truncated,
    }
}

/// Keep the first `max_chars` characters. Not token-aware.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(title: &str, body: &str) -> IssueInput {
        IssueInput {
            number: 9,
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn empty_title_and_body_is_a_precondition_failure() {
        assert!(matches!(
            issue(" ", "").validate(),
            Err(PreconditionError::EmptyIssue(9))
        ));
        assert!(issue("Crash on start", "").validate().is_ok());
        assert!(issue("", "steps to reproduce").validate().is_ok());
    }

    #[test]
    fn collect_issue_lists_repo_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("README.md"), "readme").expect("write");
        let snapshot = collect_issue(temp.path(), &issue("t", "b"), 10).expect("collect");
        assert_eq!(snapshot.file_list, vec!["README.md"]);
        assert_eq!(snapshot.issue_number, 9);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let (text, truncated) = truncate_chars("héllo wörld", 5);
        assert_eq!(text, "héllo");
        assert!(truncated);

        let (text, truncated) = truncate_chars("short", 5);
        assert_eq!(text, "short");
        assert!(!truncated);
    }

    #[test]
    fn review_snapshot_bounds_diff() {
        let input = PullRequestInput {
            number: 3,
            title: "t".to_string(),
            body: String::new(),
        };
        let snapshot = collect_review(&input, &"+line\n".repeat(100), 50);
        assert_eq!(snapshot.diff_text.chars().count(), 50);
        assert!(snapshot.diff_truncated);
    }

    #[test]
    fn diff_source_prefers_file_and_detects_missing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("pr.diff");
        fs::write(&path, "diff --git a/x b/x\n").expect("write");

        let loaded = DiffSource::from_options(Some("inline".to_string()), Some(path))
            .load()
            .expect("load");
        assert_eq!(loaded.as_deref(), Some("diff --git a/x b/x\n"));

        let missing = DiffSource::from_options(Some("   ".to_string()), None)
            .load()
            .expect("load");
        assert!(missing.is_none());

        let err = DiffSource::File(temp.path().join("absent.diff"))
            .load()
            .unwrap_err();
        assert!(matches!(err, PreconditionError::DiffFile { .. }));
    }
}
