//! Shared deterministic types for the completion result and outcome records.
//!
//! Completion results arrive from an untrusted remote model and only reach
//! these types after [`crate::core::schema`] has checked their shape. Outcome
//! records are the binding contract with the workflow that invokes the agent:
//! field names and types must stay stable.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One proposed file write: a repository-relative path and its full content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub path: String,
    pub content: String,
}

/// Validated patch proposal returned by the model for the Issue-to-Patch path.
///
/// Every field is optional on the wire; missing fields take the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatchProposal {
    pub skip: bool,
    pub reason: Option<String>,
    pub branch: Option<String>,
    pub commit_message: Option<String>,
    pub changes: Vec<ChangeItem>,
}

impl PatchProposal {
    /// Reason supplied with an explicit skip, if the model both declined and
    /// explained why.
    pub fn decline_reason(&self) -> Option<&str> {
        if !self.skip {
            return None;
        }
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
    }
}

/// Severity attached to a review suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Map the model's free-form severity label. Unknown labels fall back to `Info`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" | "error" | "high" => Self::Critical,
            "warning" | "warn" | "medium" => Self::Warning,
            _ => Self::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// One review suggestion as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub file: String,
    #[serde(default, deserialize_with = "integral_line")]
    pub line: Option<i64>,
    #[serde(default)]
    pub severity: Option<String>,
    pub message: String,
    #[serde(default)]
    pub suggested_code: Option<String>,
}

impl Suggestion {
    pub fn severity(&self) -> Severity {
        self.severity.as_deref().map_or(Severity::Info, Severity::parse)
    }

    /// Line number worth showing to a reader (positive only).
    pub fn display_line(&self) -> Option<i64> {
        self.line.filter(|line| *line > 0)
    }
}

/// JSON Schema counts `12.0` as an integer; accept it as line 12. Any other
/// non-integral number is treated as an absent line.
fn integral_line<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(raw.and_then(|number| {
        number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
                .map(|value| value as i64)
        })
    }))
}

/// Validated review returned by the model for the Diff-to-Review path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub summary: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub approved: Option<bool>,
}

impl ReviewResult {
    /// Approval verdict; absence of an explicit verdict counts as approval.
    pub fn is_approved(&self) -> bool {
        self.approved.unwrap_or(true)
    }
}

/// Outcome record written to `autofix-output.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOutcome {
    pub branch: String,
    pub commit_message: String,
    pub skip: bool,
    pub reason: Option<String>,
}

/// Outcome record written to `review-output.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    /// The model's review object as it was returned and validated.
    pub review: Value,
    pub body: String,
    pub approved: bool,
}
