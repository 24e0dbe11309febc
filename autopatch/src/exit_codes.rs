//! Stable exit codes for autopatch CLI commands.

/// Run reached a handled terminal state (patch applied, explicit skip, review
/// written, or nothing to review).
pub const OK: i32 = 0;
/// The completion call failed. The outcome record was still written.
pub const COMPLETION_FAILED: i32 = 1;
/// A required input was missing or invalid. Nothing was sent or written.
pub const PRECONDITION: i32 = 2;
