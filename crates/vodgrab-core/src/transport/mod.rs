//! HTTP transport seam.
//!
//! Pipeline stages only talk to the network through `Transport`, so the
//! fetch/retry/ordering logic is independent of the HTTP client. The
//! production implementation is `CurlTransport`.

mod curl;
#[cfg(test)]
pub(crate) mod memory;

pub use self::curl::{CurlOptions, CurlTransport};

use std::path::Path;

use crate::control::AbortToken;
use crate::retry::FetchError;

/// Blocking HTTP GET operations used by the pipeline. Implementations must be
/// safe to share between segment worker threads.
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text (lossy UTF-8).
    fn get_text(&self, url: &str, abort: &AbortToken) -> Result<String, FetchError>;

    /// GET `url` and stream the body into a newly created (truncated) file at
    /// `dest`. Returns the number of bytes written. On error `dest` may hold a
    /// partial body; the caller owns cleanup.
    fn download_to(&self, url: &str, dest: &Path, abort: &AbortToken) -> Result<u64, FetchError>;
}
