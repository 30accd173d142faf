//! Variant selection: identifier → media playlist URL.
//!
//! The manifest lists one playlist URL per quality, lowest first. The last
//! line is the highest quality by the service's convention; no bitrate
//! comparison is done.

use crate::control::AbortToken;
use crate::error::PipelineError;
use crate::identifier::ContentIdentifier;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::transport::Transport;

pub const DEFAULT_MANIFEST_URL_TEMPLATE: &str = "https://player.ooyala.com/hls/player/all/{id}.m3u8";

/// Substitute `{id}` in the manifest URL template.
pub fn manifest_url(template: &str, id: &ContentIdentifier) -> String {
    template.replace("{id}", id.as_str())
}

/// Last non-empty line of a variant manifest, trimmed.
pub fn select_variant(body: &str) -> Option<String> {
    body.trim_end()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(str::to_string)
}

/// Fetch the variant manifest for `id` and return the selected playlist URL.
pub fn resolve_variant(
    transport: &dyn Transport,
    template: &str,
    id: &ContentIdentifier,
    policy: &RetryPolicy,
    abort: &AbortToken,
) -> Result<String, PipelineError> {
    let url = manifest_url(template, id);
    tracing::debug!("fetching variant manifest {}", url);
    let body = run_with_retry(policy, abort, || transport.get_text(&url, abort))
        .map_err(|e| PipelineError::from_fetch(&url, None, e))?;
    let variant = select_variant(&body).ok_or_else(|| PipelineError::EmptyManifest { url: url.clone() })?;
    tracing::info!("selected variant playlist {}", variant);
    Ok(variant)
}
