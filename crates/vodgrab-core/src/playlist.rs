//! Segment enumeration: media playlist URL → ordered segment URLs.
//!
//! Only lines that start with `https://` are segments. Tags, comments and
//! blank lines are dropped without interpretation.

use crate::control::AbortToken;
use crate::error::PipelineError;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::transport::Transport;

pub const SEGMENT_URL_PREFIX: &str = "https://";

/// Segment URLs in playlist order.
pub fn segment_urls(body: &str) -> Vec<String> {
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| line.starts_with(SEGMENT_URL_PREFIX))
        .map(str::to_string)
        .collect()
}

/// Fetch the media playlist and list its segments. An empty list is not an
/// error here; the coordinator decides what to do with it.
pub fn enumerate_segments(
    transport: &dyn Transport,
    playlist_url: &str,
    policy: &RetryPolicy,
    abort: &AbortToken,
) -> Result<Vec<String>, PipelineError> {
    let body = run_with_retry(policy, abort, || transport.get_text(playlist_url, abort))
        .map_err(|e| PipelineError::from_fetch(playlist_url, None, e))?;
    let urls = segment_urls(&body);
    tracing::info!("playlist lists {} segment(s)", urls.len());
    Ok(urls)
}
