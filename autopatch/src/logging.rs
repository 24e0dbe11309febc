//! Process diagnostics via `tracing`.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: Diagnostics filtered by `RUST_LOG`, written to
//!   stderr so `--dry-run` output on stdout stays clean.
//!
//! - **Outcome records (`io/outcome`)**: The product artifact consumed by the
//!   workflow. Always written, unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `info` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=autopatch=debug autopatch fix --issue-number 7
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
