use std::time::Duration;

use crate::config::RetryConfig;

/// Why a fetch failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    /// Could not connect, or the connection dropped mid-transfer.
    Connection,
    /// 429 or 503: the CDN wants us to back off.
    Throttled,
    /// Any other 5xx.
    ServerError,
    /// Retrying cannot help (4xx, local disk errors, cancellation).
    Permanent,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, ErrorKind::Permanent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    GiveUp,
    RetryAfter(Duration),
}

/// Attempt budget and exponential backoff shared by manifest, playlist and
/// segment fetches.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per fetch, counting the first one.
    pub max_attempts: u32,
    /// Wait after the first failure; doubled after each further failure.
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        let base = if cfg.base_delay_secs.is_finite() && cfg.base_delay_secs > 0.0 {
            Duration::from_secs_f64(cfg.base_delay_secs)
        } else {
            Duration::ZERO
        };
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: base,
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before the attempt following failed attempt number `failed` (1-based).
    pub fn backoff(&self, failed: u32) -> Duration {
        let doublings = failed.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay)
    }

    /// What to do after attempt number `failed` ended with an error of `kind`.
    pub fn decide(&self, failed: u32, kind: ErrorKind) -> RetryDecision {
        if !kind.is_transient() || failed >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.backoff(failed))
        }
    }
}
