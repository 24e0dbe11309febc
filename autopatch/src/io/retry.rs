//! Caller-side retry around a single-attempt [`CompletionClient`].

use std::thread;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tracing::warn;

use crate::io::completion::{CompletionClient, CompletionError};
use crate::io::config::RetrySettings;

/// Call `client` until it succeeds, fails with a non-transient error, or
/// `settings.max_attempts` attempts are spent.
pub fn complete_with_retry<C: CompletionClient + ?Sized>(
    client: &C,
    prompt: &str,
    settings: &RetrySettings,
) -> Result<Value, CompletionError> {
    let max_attempts = settings.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match client.complete(prompt) {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let delay = backoff_delay(settings, attempt, &mut rand::thread_rng());
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    err = %err,
                    "transient completion failure, retrying"
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Exponential backoff capped at `max_delay_ms`, plus jitter in `[0, base_delay_ms)`.
pub fn backoff_delay<R: Rng>(settings: &RetrySettings, attempt: u32, rng: &mut R) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let exp = settings
        .base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(settings.max_delay_ms);
    let jitter = if settings.base_delay_ms == 0 {
        0
    } else {
        rng.gen_range(0..settings.base_delay_ms)
    };
    Duration::from_millis(exp + jitter)
}
