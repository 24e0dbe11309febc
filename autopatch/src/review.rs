//! Orchestration for one Diff-to-Review run.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::core::review_body::render_review_body;
use crate::core::schema::parse_review;
use crate::core::types::{ReviewOutcome, ReviewResult};
use crate::exit_codes;
use crate::io::completion::{CompletionClient, CompletionError};
use crate::io::config::AgentConfig;
use crate::io::context::{PullRequestInput, collect_review};
use crate::io::outcome::write_outcome;
use crate::io::prompt::PromptBuilder;
use crate::io::retry::complete_with_retry;

pub const NOTHING_TO_REVIEW: &str = "Nothing to review: the pull request has no diff.";

/// Result of a review run. The outcome record has already been written.
#[derive(Debug, Clone)]
pub struct ReviewRun {
    pub record: ReviewOutcome,
    pub failure: Option<CompletionError>,
}

impl ReviewRun {
    pub fn exit_code(&self) -> i32 {
        if self.failure.is_some() {
            exit_codes::COMPLETION_FAILED
        } else {
            exit_codes::OK
        }
    }
}

/// Render the review prompt without calling the endpoint.
pub fn review_prompt(config: &AgentConfig, input: &PullRequestInput, diff: &str) -> Result<String> {
    let snapshot = collect_review(input, diff, config.limits.max_diff_chars);
    PromptBuilder::new().build_review(&snapshot)
}

/// Run the full pipeline for one pull request.
///
/// `diff == None` is the "nothing to review" terminal state: no request is
/// sent and the record approves the empty change.
#[instrument(skip_all, fields(pr = input.number))]
pub fn run_review<C: CompletionClient + ?Sized>(
    config: &AgentConfig,
    input: &PullRequestInput,
    diff: Option<&str>,
    client: &C,
) -> Result<ReviewRun> {
    let run = match diff {
        None => {
            info!("no diff supplied, nothing to review");
            ReviewRun {
                record: synthetic_outcome(NOTHING_TO_REVIEW, true)?,
                failure: None,
            }
        }
        Some(diff) => {
            let prompt = review_prompt(config, input, diff)?;
            let completion = complete_with_retry(client, &prompt, &config.retry).and_then(|value| {
                let review = parse_review(&value)?;
                Ok((value, review))
            });
            match completion {
                Ok((value, review)) => ReviewRun {
                    record: ReviewOutcome {
                        body: render_review_body(&review),
                        approved: review.is_approved(),
                        review: value,
                    },
                    failure: None,
                },
                Err(err) => {
                    warn!(err = %err, "completion failed, recording failed review");
                    ReviewRun {
                        record: synthetic_outcome(&format!("Review failed: {err}"), false)?,
                        failure: Some(err),
                    }
                }
            }
        }
    };

    write_outcome(&config.review_output_path(), &run.record)?;
    info!(approved = run.record.approved, "review finished");
    Ok(run)
}

/// Outcome for runs where the model produced no review.
fn synthetic_outcome(summary: &str, approved: bool) -> Result<ReviewOutcome> {
    let review = ReviewResult {
        summary: summary.to_string(),
        suggestions: Vec::new(),
        approved: Some(approved),
    };
    let value: Value = serde_json::to_value(&review).context("serialize review")?;
    Ok(ReviewOutcome {
        body: render_review_body(&review),
        approved,
        review: value,
    })
}
