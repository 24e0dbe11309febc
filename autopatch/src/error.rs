//! Typed failures that decide the process exit code.

use std::path::PathBuf;

use thiserror::Error;

/// A required input is missing or invalid. Raised before any network call or
/// filesystem write.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("missing API key (set LLM_API_KEY or pass --api-key)")]
    MissingApiKey,
    #[error("issue #{0} has an empty title and body")]
    EmptyIssue(u64),
    #[error("repository root {} is not a readable directory", .0.display())]
    RepoRoot(PathBuf),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("invalid base URL '{url}': {message}")]
    BaseUrl { url: String, message: String },
    #[error("read diff file {}: {message}", .path.display())]
    DiffFile { path: PathBuf, message: String },
}
