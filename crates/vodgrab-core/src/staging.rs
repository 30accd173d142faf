//! Staging area layout and file lifecycle.
//!
//! Segments are staged under `{output_dir}/{identifier}/`. Each download goes
//! to `{name}.part` first and is renamed into place only when complete, so a
//! staged file always holds exactly one successful transfer.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::identifier::ContentIdentifier;

/// Suffix of in-progress segment files.
pub const PART_SUFFIX: &str = ".part";

/// `{output_dir}/{identifier}`
pub fn staging_dir(output_dir: &Path, id: &ContentIdentifier) -> PathBuf {
    output_dir.join(id.as_str())
}

/// `{output_dir}/{identifier}.{ext}`. An empty extension means `ts`; the
/// bare identifier is the staging directory.
pub fn output_path(output_dir: &Path, id: &ContentIdentifier, ext: &str) -> PathBuf {
    let ext = match ext.trim_start_matches('.') {
        "" => "ts",
        e => e,
    };
    output_dir.join(format!("{}.{}", id.as_str(), ext))
}

/// Path for the in-progress file: appends `.part` (e.g. `seg1.ts` → `seg1.ts.part`).
pub fn part_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(PART_SUFFIX);
    PathBuf::from(o)
}

/// Create the staging directory. An existing directory is fine, and
/// concurrent callers racing on first use all succeed.
pub fn ensure_dir(dir: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(dir).map_err(|source| PipelineError::FileWrite {
        path: dir.to_path_buf(),
        source,
    })
}

/// Atomically move a finished `.part` file over `final_path`, replacing any
/// file left by an earlier run.
pub fn finalize(part: &Path, final_path: &Path) -> Result<(), PipelineError> {
    std::fs::rename(part, final_path).map_err(|source| PipelineError::FileWrite {
        path: final_path.to_path_buf(),
        source,
    })
}

/// Best-effort removal of a failed `.part` file.
pub fn discard_part(part: &Path) {
    match std::fs::remove_file(part) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove {}: {}", part.display(), e),
    }
}

/// Remove the staging directory and everything in it.
pub fn remove_staging(dir: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
