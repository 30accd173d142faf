//! Cancellation for a running pipeline.
//!
//! A single `AbortToken` is shared by the coordinator, every segment worker
//! and the transport. Setting it stops in-flight transfers (via the curl
//! progress callback), cuts retry sleeps short and makes the pipeline fail
//! with `PipelineError::Cancelled`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Idempotent.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
