//! Transport-level fetch error used for retry classification.

use std::fmt;

/// Error returned by a single HTTP fetch (manifest, playlist or segment).
/// Kept separate from `PipelineError` so retries can be decided before the
/// failure is attributed to a pipeline stage.
#[derive(Debug)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Writing the response body to disk failed. Not retried.
    Storage(std::io::Error),
    /// The transfer was stopped through the abort token.
    Aborted,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Curl(e) => write!(f, "{}", e),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::Storage(e) => write!(f, "storage: {}", e),
            FetchError::Aborted => write!(f, "transfer aborted"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Curl(e) => Some(e),
            FetchError::Storage(e) => Some(e),
            FetchError::Http(_) | FetchError::Aborted => None,
        }
    }
}
