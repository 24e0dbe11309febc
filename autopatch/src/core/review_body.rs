//! Markdown rendering of a review for posting as a pull-request comment.

use std::fmt::Write;

use crate::core::types::{ReviewResult, Severity, Suggestion};

fn marker(severity: Severity) -> String {
    let icon = match severity {
        Severity::Critical => "🔴",
        Severity::Warning => "🟡",
        Severity::Info => "🔵",
    };
    format!("{icon} **{}**", severity.as_str())
}

/// Render the review body: summary first, then one block per suggestion.
pub fn render_review_body(review: &ReviewResult) -> String {
    let mut body = String::new();
    body.push_str("## Automated review\n\n");
    body.push_str(review.summary.trim());
    body.push('\n');

    if review.suggestions.is_empty() {
        return body;
    }

    body.push_str("\n### Suggestions\n");
    for suggestion in &review.suggestions {
        body.push('\n');
        render_suggestion(&mut body, suggestion);
    }
    body
}

fn render_suggestion(body: &mut String, suggestion: &Suggestion) {
    let location = match suggestion.display_line() {
        Some(line) => format!("`{}` line {line}", suggestion.file),
        None => format!("`{}`", suggestion.file),
    };
    // Writing to a String cannot fail.
    let _ = writeln!(
        body,
        "- {} {location}: {}",
        marker(suggestion.severity()),
        suggestion.message.trim()
    );
    if let Some(code) = suggestion
        .suggested_code
        .as_deref()
        .filter(|code| !code.trim().is_empty())
    {
        let _ = writeln!(body, "\n  ```\n{}\n  ```", indent(code.trim_end()));
    }
}

fn indent(code: &str) -> String {
    code.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
