//! LLM-backed repository automation: issue-to-patch and diff-to-review.
//!
//! The crate keeps the untrusted parts of the pipeline behind narrow seams:
//!
//! - **[`core`]**: Pure, deterministic logic (result types, schema validation,
//!   path containment, naming, review rendering). No I/O.
//! - **[`io`]**: Side-effecting operations (configuration, repository listing,
//!   prompt rendering, the completion HTTP client, file writes, outcome records).
//!
//! Orchestration modules ([`autofix`], [`review`]) coordinate core logic with
//! I/O to implement the CLI subcommands.

pub mod autofix;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod review;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
