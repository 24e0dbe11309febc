//! Prompt rendering for both pipelines.
//!
//! Prompts are a pure function of a context snapshot: the same snapshot always
//! renders to the same string. Issue and pull-request text is embedded
//! verbatim; the consumer is a model, not a shell.

use anyhow::Result;
use minijinja::Environment;

use crate::io::context::{IssueSnapshot, ReviewSnapshot};

const AUTOFIX_TEMPLATE: &str = include_str!("prompts/autofix.md");
const REVIEW_TEMPLATE: &str = include_str!("prompts/review.md");

/// Template engine wrapper around minijinja.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("autofix", AUTOFIX_TEMPLATE)
            .expect("autofix template should be valid");
        env.add_template("review", REVIEW_TEMPLATE)
            .expect("review template should be valid");
        Self { env }
    }

    /// Render the Issue-to-Patch prompt.
    pub fn build_autofix(&self, snapshot: &IssueSnapshot) -> Result<String> {
        let template = self.env.get_template("autofix")?;
        Ok(template.render(snapshot)?)
    }

    /// Render the Diff-to-Review prompt.
    pub fn build_review(&self, snapshot: &ReviewSnapshot) -> Result<String> {
        let template = self.env.get_template("review")?;
        Ok(template.render(snapshot)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_snapshot() -> IssueSnapshot {
        IssueSnapshot {
            issue_number: 42,
            title: "Crash when `config` is <empty>".to_string(),
            body: "Run with {\"x\": 1} & see $(panic)".to_string(),
            file_list: vec!["src/main.rs".to_string(), "src/lib.rs".to_string()],
        }
    }

    fn review_snapshot(truncated: bool) -> ReviewSnapshot {
        ReviewSnapshot {
            pr_number: 7,
            title: "Add cache".to_string(),
            body: "Adds an LRU cache.".to_string(),
            diff_text: "+fn cache() {}".to_string(),
            diff_truncated: truncated,
        }
    }

    /// Same snapshot, same prompt.
    #[test]
    fn autofix_prompt_is_deterministic() {
        let builder = PromptBuilder::new();
        let first = builder.build_autofix(&issue_snapshot()).expect("render");
        let second = PromptBuilder::new()
            .build_autofix(&issue_snapshot())
            .expect("render");
        assert_eq!(first, second);
    }

    /// Metadata is embedded verbatim, with no escaping or sanitizing.
    #[test]
    fn autofix_prompt_embeds_issue_verbatim() {
        let prompt = PromptBuilder::new()
            .build_autofix(&issue_snapshot())
            .expect("render");
        assert!(prompt.contains("<issue number=\"42\">"));
        assert!(prompt.contains("Crash when `config` is <empty>"));
        assert!(prompt.contains("Run with {\"x\": 1} & see $(panic)"));
        assert!(prompt.contains("src/main.rs\nsrc/lib.rs\n</repository_files>"));
    }

    #[test]
    fn autofix_prompt_states_contract_and_policy() {
        let prompt = PromptBuilder::new()
            .build_autofix(&issue_snapshot())
            .expect("render");
        for needle in [
            "\"skip\": boolean",
            "\"commitMessage\": string",
            "\"changes\": [ { \"path\": string, \"content\": string } ]",
            "no code fences",
            "minimal change",
            "existing code style",
            "set \"skip\" to true",
        ] {
            assert!(prompt.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn review_prompt_embeds_diff_and_contract() {
        let prompt = PromptBuilder::new()
            .build_review(&review_snapshot(false))
            .expect("render");
        assert!(prompt.contains("<pull_request number=\"7\">"));
        assert!(prompt.contains("+fn cache() {}"));
        assert!(prompt.contains("\"approved\": boolean"));
        assert!(prompt.contains("\"suggestedCode\""));
        assert!(!prompt.contains("truncated=\"true\""));
    }

    #[test]
    fn review_prompt_mentions_truncation() {
        let prompt = PromptBuilder::new()
            .build_review(&review_snapshot(true))
            .expect("render");
        assert!(prompt.contains("<diff truncated=\"true\">"));
        assert!(prompt.contains("cut off at a size limit"));
    }
}
