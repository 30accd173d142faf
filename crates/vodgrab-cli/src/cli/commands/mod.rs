//! CLI command handlers. Each command is in its own file.

mod get;
mod id;
mod segments;

pub use get::{run_get, GetArgs};
pub use id::run_id;
pub use segments::run_segments;

use anyhow::{Context, Result};
use vodgrab_core::config::VodgrabConfig;
use vodgrab_core::control::AbortToken;
use vodgrab_core::transport::{CurlOptions, CurlTransport};

/// Abort token that fires on the first Ctrl-C.
pub(crate) fn abort_on_ctrl_c() -> AbortToken {
    let abort = AbortToken::new();
    let token = abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupted; stopping transfers...");
            tracing::warn!("interrupt received, aborting");
            token.abort();
        }
    });
    abort
}

pub(crate) fn transport_for(cfg: &VodgrabConfig) -> CurlTransport {
    CurlTransport::new(CurlOptions::from(&cfg.http))
}

/// Run blocking pipeline work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("worker task panicked")?
}
