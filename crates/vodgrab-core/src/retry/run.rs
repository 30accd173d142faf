//! Retry loop: run a closure until success or policy says stop.

use std::time::{Duration, Instant};

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};
use crate::control::AbortToken;

/// Granularity of abort checks while sleeping between attempts.
const ABORT_POLL: Duration = Duration::from_millis(50);

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
/// The sleep is cut short (returning `FetchError::Aborted`) when `abort` fires.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, abort: &AbortToken, mut f: F) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        if abort.is_aborted() {
            return Err(FetchError::Aborted);
        }
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::GiveUp => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!(attempt, ?kind, delay_ms = d.as_millis() as u64, "retrying after {}", e);
                        if !sleep_unless_aborted(d, abort) {
                            return Err(FetchError::Aborted);
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}

/// Sleeps for `d` in short slices. Returns false if `abort` fired first.
pub fn sleep_unless_aborted(d: Duration, abort: &AbortToken) -> bool {
    let deadline = Instant::now() + d;
    loop {
        if abort.is_aborted() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(ABORT_POLL));
    }
}
