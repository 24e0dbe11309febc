//! Materialize validated change items onto the repository checkout.
//!
//! Each item is independent: an unsafe or failing item is logged and skipped,
//! the rest of the batch still applies. An accepted item is written in full
//! (temp file + rename) or not at all.
//!
//! No locking is performed. The invoking workflow must guarantee that at most
//! one invocation writes to a given repository root at a time.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::core::containment::{Rejection, is_inside, resolve_within};
use crate::core::types::ChangeItem;
use crate::io::config::Limits;

/// A change item that was not written, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChange {
    pub path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Failed validation; never touched the filesystem.
    Rejected(Rejection),
    /// Passed validation but the write itself failed.
    WriteFailed(String),
}

/// What happened to each change item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Repository-relative paths that were written.
    pub written: Vec<String>,
    pub skipped: Vec<SkippedChange>,
}

impl ApplyReport {
    pub fn rejected_paths(&self) -> Vec<&str> {
        self.skipped
            .iter()
            .filter(|skip| matches!(skip.reason, SkipReason::Rejected(_)))
            .map(|skip| skip.path.as_str())
            .collect()
    }
}

/// Write every acceptable change under `root`, overwriting existing files.
#[instrument(skip_all, fields(root = %root.display(), changes = changes.len()))]
pub fn apply_changes(root: &Path, changes: &[ChangeItem], limits: &Limits) -> Result<ApplyReport> {
    let root = root
        .canonicalize()
        .with_context(|| format!("canonicalize repository root {}", root.display()))?;
    let mut report = ApplyReport::default();

    for (index, change) in changes.iter().enumerate() {
        let target = match check_change(&root, index, change, limits) {
            Ok(target) => target,
            Err(rejection) => {
                warn!(path = %change.path, reason = %rejection, "rejected change");
                report.skipped.push(SkippedChange {
                    path: change.path.clone(),
                    reason: SkipReason::Rejected(rejection),
                });
                continue;
            }
        };

        match write_file(&target, &change.content) {
            Ok(()) => {
                let relative = display_relative(&root, &target);
                debug!(path = %relative, bytes = change.content.len(), "wrote change");
                report.written.push(relative);
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(path = %change.path, err = %message, "failed to write change");
                report.skipped.push(SkippedChange {
                    path: change.path.clone(),
                    reason: SkipReason::WriteFailed(message),
                });
            }
        }
    }

    info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        "applied changes"
    );
    Ok(report)
}

fn check_change(
    root: &Path,
    index: usize,
    change: &ChangeItem,
    limits: &Limits,
) -> Result<PathBuf, Rejection> {
    if index >= limits.max_changes {
        return Err(Rejection::OverLimit {
            limit: limits.max_changes,
        });
    }
    if change.content.len() > limits.max_file_bytes {
        return Err(Rejection::TooLarge {
            bytes: change.content.len(),
            limit: limits.max_file_bytes,
        });
    }
    let target = resolve_within(root, &change.path)?;
    check_existing_ancestor(root, &target)?;
    Ok(target)
}

/// Follow symlinks on the part of `target` that already exists and make sure
/// it still lands inside `root`.
fn check_existing_ancestor(root: &Path, target: &Path) -> Result<(), Rejection> {
    let existing = target
        .ancestors()
        .find(|candidate| fs::symlink_metadata(candidate).is_ok())
        .ok_or(Rejection::Escapes)?;
    let resolved = existing.canonicalize().map_err(|_| Rejection::Escapes)?;
    if resolved == root || is_inside(root, &resolved) {
        return Ok(());
    }
    Err(Rejection::Escapes)
}

fn write_file(target: &Path, content: &str) -> Result<()> {
    let parent = target
        .parent()
        .with_context(|| format!("path missing parent {}", target.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;

    let mut tmp_name = OsString::from(".");
    tmp_name.push(target.file_name().unwrap_or_default());
    tmp_name.push(".autopatch.tmp");
    let tmp_path = parent.join(tmp_name);

    fs::write(&tmp_path, content).with_context(|| format!("write {}", tmp_path.display()))?;
    if let Err(err) = fs::rename(&tmp_path, target) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("replace {}", target.display()));
    }
    Ok(())
}

fn display_relative(root: &Path, target: &Path) -> String {
    target
        .strip_prefix(root)
        .unwrap_or(target)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
