//! Orchestration for one Issue-to-Patch run.
//!
//! Collect context, render the prompt, call the completion endpoint, validate
//! the proposal, apply safe changes, and write the outcome record.

use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::naming::{
    default_branch, default_commit_message, resolve_branch, resolve_commit_message,
};
use crate::core::schema::parse_patch;
use crate::core::types::{PatchOutcome, PatchProposal};
use crate::exit_codes;
use crate::io::apply::{ApplyReport, apply_changes};
use crate::io::completion::{CompletionClient, CompletionError};
use crate::io::config::{AgentConfig, Limits};
use crate::io::context::{IssueInput, collect_issue};
use crate::io::outcome::write_outcome;
use crate::io::prompt::PromptBuilder;
use crate::io::retry::complete_with_retry;

pub const NO_CHANGES_REASON: &str = "no changes produced";

/// Result of a patch run. The outcome record has already been written.
#[derive(Debug, Clone)]
pub struct AutofixRun {
    pub record: PatchOutcome,
    pub report: ApplyReport,
    /// Completion failure that ended the run early, if any.
    pub failure: Option<CompletionError>,
}

impl AutofixRun {
    pub fn exit_code(&self) -> i32 {
        if self.failure.is_some() {
            exit_codes::COMPLETION_FAILED
        } else {
            exit_codes::OK
        }
    }
}

/// Render the prompt for `input` without calling the endpoint.
pub fn autofix_prompt(config: &AgentConfig, input: &IssueInput) -> Result<String> {
    let snapshot = collect_issue(&config.repo_root, input, config.limits.max_files)?;
    PromptBuilder::new().build_autofix(&snapshot)
}

/// Run the full pipeline for one issue.
///
/// Precondition failures return `Err` before any request is sent. Completion
/// failures do not: they produce a skipped outcome record and set
/// [`AutofixRun::failure`].
#[instrument(skip_all, fields(issue = input.number))]
pub fn run_autofix<C: CompletionClient + ?Sized>(
    config: &AgentConfig,
    input: &IssueInput,
    client: &C,
) -> Result<AutofixRun> {
    let prompt = autofix_prompt(config, input)?;

    let proposal = complete_with_retry(client, &prompt, &config.retry)
        .and_then(|value| parse_patch(&value).map_err(CompletionError::from));

    let run = match proposal {
        Ok(proposal) => apply_proposal(&config.repo_root, &config.limits, input.number, &proposal)?,
        Err(err) => {
            warn!(err = %err, "completion failed, recording skipped outcome");
            AutofixRun {
                record: PatchOutcome {
                    branch: default_branch(input.number),
                    commit_message: default_commit_message(input.number),
                    skip: true,
                    reason: Some(err.to_string()),
                },
                report: ApplyReport::default(),
                failure: Some(err),
            }
        }
    };

    write_outcome(&config.patch_output_path(), &run.record)?;
    info!(
        skip = run.record.skip,
        branch = %run.record.branch,
        written = run.report.written.len(),
        "autofix finished"
    );
    Ok(run)
}

/// Turn a validated proposal into file writes and an outcome record.
pub fn apply_proposal(
    root: &Path,
    limits: &Limits,
    issue_number: u64,
    proposal: &PatchProposal,
) -> Result<AutofixRun> {
    let branch = resolve_branch(proposal.branch.as_deref(), issue_number);
    let commit_message = resolve_commit_message(proposal.commit_message.as_deref(), issue_number);
    let skipped = |reason: &str| AutofixRun {
        record: PatchOutcome {
            branch: branch.clone(),
            commit_message: commit_message.clone(),
            skip: true,
            reason: Some(reason.to_string()),
        },
        report: ApplyReport::default(),
        failure: None,
    };

    if let Some(reason) = proposal.decline_reason() {
        info!(reason, "model declined to patch");
        return Ok(skipped(reason));
    }
    if proposal.changes.is_empty() {
        return Ok(skipped(NO_CHANGES_REASON));
    }

    // Rejected and failed items are reported, not folded into the record.
    let report = apply_changes(root, &proposal.changes, limits)?;
    if report.written.is_empty() {
        warn!(
            skipped = report.skipped.len(),
            "no proposed change was written"
        );
    }

    Ok(AutofixRun {
        record: PatchOutcome {
            branch,
            commit_message,
            skip: false,
            reason: None,
        },
        report,
        failure: None,
    })
}
