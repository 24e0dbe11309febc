//! I/O helpers for the agent pipelines.

pub mod apply;
pub mod completion;
pub mod config;
pub mod context;
pub mod listing;
pub mod outcome;
pub mod prompt;
pub mod retry;
