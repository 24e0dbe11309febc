//! Shape validation for untrusted completion results.
//!
//! The model's JSON is checked against an embedded JSON Schema first, then
//! decoded into typed structs with explicit defaults. Any mismatch is reported
//! as a [`SchemaError`] instead of surfacing later as an unrelated failure.

use std::sync::LazyLock;

use jsonschema::{Draft, Validator};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::core::types::{PatchProposal, ReviewResult};

const PATCH_SCHEMA: &str = include_str!("../../schemas/patch_result.schema.json");
const REVIEW_SCHEMA: &str = include_str!("../../schemas/review_result.schema.json");

static PATCH_VALIDATOR: LazyLock<Validator> =
    LazyLock::new(|| compile(PATCH_SCHEMA).expect("patch schema should be valid"));
static REVIEW_VALIDATOR: LazyLock<Validator> =
    LazyLock::new(|| compile(REVIEW_SCHEMA).expect("review schema should be valid"));

/// A completion result whose shape does not match the expected contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .violations.join("; "))]
pub struct SchemaError {
    pub violations: Vec<String>,
}

impl SchemaError {
    fn single(message: impl Into<String>) -> Self {
        Self {
            violations: vec![message.into()],
        }
    }
}

/// Validate and decode a patch proposal.
///
/// Missing fields default (`changes` → empty, `skip` → false); wrong types are errors.
pub fn parse_patch(value: &Value) -> Result<PatchProposal, SchemaError> {
    decode(&PATCH_VALIDATOR, value)
}

/// Validate and decode a review result. `summary` is the only required field.
pub fn parse_review(value: &Value) -> Result<ReviewResult, SchemaError> {
    decode(&REVIEW_VALIDATOR, value)
}

fn compile(raw: &str) -> Result<Validator, String> {
    let schema: Value = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .map_err(|err| err.to_string())
}

fn decode<T: DeserializeOwned>(validator: &Validator, value: &Value) -> Result<T, SchemaError> {
    let violations: Vec<String> = validator
        .iter_errors(value)
        .map(|err| err.to_string())
        .collect();
    if !violations.is_empty() {
        return Err(SchemaError { violations });
    }
    serde_json::from_value(without_null_fields(value))
        .map_err(|err| SchemaError::single(format!("decode completion result: {err}")))
}

/// Drop top-level `null` members so they take the same defaults as absent ones.
fn without_null_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_changes_defaults_to_empty() {
        let proposal = parse_patch(&json!({ "branch": "fix/x" })).expect("parse");
        assert!(proposal.changes.is_empty());
        assert!(!proposal.skip);
        assert_eq!(proposal.branch.as_deref(), Some("fix/x"));
    }

    #[test]
    fn null_fields_take_defaults() {
        let proposal = parse_patch(&json!({
            "skip": null,
            "reason": null,
            "changes": null,
            "commitMessage": null
        }))
        .expect("parse");
        assert_eq!(proposal, PatchProposal::default());
    }

    #[test]
    fn camel_case_commit_message_is_read() {
        let proposal = parse_patch(&json!({
            "commitMessage": "fix: typo",
            "changes": [{ "path": "a.txt", "content": "x" }]
        }))
        .expect("parse");
        assert_eq!(proposal.commit_message.as_deref(), Some("fix: typo"));
        assert_eq!(proposal.changes.len(), 1);
    }

    /// A change item without string content is a shape error, not a silent skip.
    #[test]
    fn change_without_content_is_rejected() {
        let err = parse_patch(&json!({ "changes": [{ "path": "a.txt" }] })).unwrap_err();
        assert!(!err.violations.is_empty());
    }

    #[test]
    fn wrong_top_level_type_is_rejected() {
        assert!(parse_patch(&json!(["not", "an", "object"])).is_err());
        assert!(parse_patch(&json!({ "skip": "yes" })).is_err());
    }

    #[test]
    fn review_requires_summary() {
        let err = parse_review(&json!({ "approved": true })).unwrap_err();
        assert!(err.to_string().contains("summary"));
    }

    #[test]
    fn review_defaults_suggestions_and_approval() {
        let review = parse_review(&json!({ "summary": "fine", "suggestions": null })).expect("parse");
        assert!(review.suggestions.is_empty());
        assert!(review.is_approved());
    }

    #[test]
    fn review_suggestion_fields_decode() {
        let review = parse_review(&json!({
            "summary": "issues",
            "approved": false,
            "suggestions": [{
                "file": "src/lib.rs",
                "line": 7,
                "severity": "critical",
                "message": "unchecked index",
                "suggestedCode": "v.get(i)"
            }]
        }))
        .expect("parse");
        assert!(!review.is_approved());
        let suggestion = &review.suggestions[0];
        assert_eq!(suggestion.display_line(), Some(7));
        assert_eq!(suggestion.suggested_code.as_deref(), Some("v.get(i)"));
    }

    #[test]
    fn integral_float_line_is_read_as_integer() {
        let review = parse_review(&json!({
            "summary": "issues",
            "suggestions": [
                { "file": "a.rs", "line": 12.0, "message": "m" },
                { "file": "b.rs", "line": 3, "message": "m" }
            ]
        }))
        .expect("12.0 satisfies the integer schema");
        assert_eq!(review.suggestions[0].line, Some(12));
        assert_eq!(review.suggestions[1].line, Some(3));
    }

    #[test]
    fn fractional_line_fails_validation() {
        let result = parse_review(&json!({
            "summary": "issues",
            "suggestions": [{ "file": "a.rs", "line": 1.5, "message": "m" }]
        }));
        assert!(result.is_err());
    }
}
