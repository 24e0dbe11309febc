//! Deterministic, pure logic shared by both pipelines.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (completion results, candidate paths) and return deterministic
//! outputs suitable for tests.

pub mod containment;
pub mod naming;
pub mod review_body;
pub mod schema;
pub mod types;
