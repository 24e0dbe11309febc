//! Outcome record persistence (`autofix-output.json`, `review-output.json`).
//!
//! The record is written once at the end of a run and replaces any previous
//! record. Readers ignore unknown fields.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Atomically write `record` as pretty JSON with a trailing newline.
pub fn write_outcome<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    debug!(path = %path.display(), "writing outcome record");
    let mut buf = serde_json::to_string_pretty(record).context("serialize outcome record")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Load an outcome record from disk.
pub fn read_outcome<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read outcome {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse outcome {}", path.display()))
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("outcome path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp outcome {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace outcome {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{PatchOutcome, ReviewOutcome};
    use serde_json::json;

    #[test]
    fn patch_outcome_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("autofix-output.json");
        let record = PatchOutcome {
            branch: "autopatch/issue-1".to_string(),
            commit_message: "fix: resolve issue #1".to_string(),
            skip: true,
            reason: Some("not enough context".to_string()),
        };

        write_outcome(&path, &record).expect("write");
        let loaded: PatchOutcome = read_outcome(&path).expect("read");
        assert_eq!(loaded, record);
    }

    /// Field names are the contract with the workflow and must not drift.
    #[test]
    fn patch_outcome_uses_stable_field_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("autofix-output.json");
        let record = PatchOutcome {
            branch: "b".to_string(),
            commit_message: "m".to_string(),
            skip: false,
            reason: None,
        };
        write_outcome(&path, &record).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        let expected = "{\n  \"branch\": \"b\",\n  \"commitMessage\": \"m\",\n  \"skip\": false,\n  \"reason\": null\n}\n";
        assert_eq!(contents, expected);
    }

    #[test]
    fn readers_ignore_unknown_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("review-output.json");
        fs::write(
            &path,
            json!({ "review": { "summary": "s" }, "body": "b", "approved": false, "extra": 1 })
                .to_string(),
        )
        .expect("write");
        let loaded: ReviewOutcome = read_outcome(&path).expect("read");
        assert!(!loaded.approved);
        assert_eq!(loaded.body, "b");
    }

    #[test]
    fn rewrite_replaces_previous_record() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out").join("autofix-output.json");
        for skip in [true, false] {
            let record = PatchOutcome {
                branch: "b".to_string(),
                commit_message: "m".to_string(),
                skip,
                reason: None,
            };
            write_outcome(&path, &record).expect("write");
        }
        let loaded: PatchOutcome = read_outcome(&path).expect("read");
        assert!(!loaded.skip);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
