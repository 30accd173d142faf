//! Single-segment download into the staging directory.

use std::path::Path;

use crate::control::AbortToken;
use crate::error::PipelineError;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::staging;
use crate::transport::Transport;

/// Downloads one segment to `dest` via `{dest}.part`, retrying per `policy`.
/// On failure no `.part` file is left behind and `dest` is untouched.
pub(super) fn download_segment(
    transport: &dyn Transport,
    url: &str,
    dest: &Path,
    policy: &RetryPolicy,
    abort: &AbortToken,
) -> Result<u64, PipelineError> {
    let part = staging::part_path(dest);
    let res = run_with_retry(policy, abort, || transport.download_to(url, &part, abort));
    match res {
        Ok(bytes) => {
            if let Err(e) = staging::finalize(&part, dest) {
                staging::discard_part(&part);
                return Err(e);
            }
            Ok(bytes)
        }
        Err(e) => {
            staging::discard_part(&part);
            Err(PipelineError::from_fetch(url, Some(&part), e))
        }
    }
}
