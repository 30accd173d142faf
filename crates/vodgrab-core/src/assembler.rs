//! Concatenates staged segments, in order, into the output artifact.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Appends the full contents of each file in `paths`, in order, to `output`
/// (created if missing). Each segment is read completely and written in one
/// pass before the next is touched. Returns the number of bytes appended.
///
/// On failure the partially written output is left in place.
pub fn assemble(paths: &[PathBuf], output: &Path) -> Result<u64, PipelineError> {
    let write_err = |source: std::io::Error| PipelineError::FileWrite {
        path: output.to_path_buf(),
        source,
    };

    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output)
        .map_err(write_err)?;

    let mut total = 0u64;
    for path in paths {
        let data = std::fs::read(path).map_err(|source| PipelineError::FileRead {
            path: path.clone(),
            source,
        })?;
        out.write_all(&data).map_err(write_err)?;
        total += data.len() as u64;
    }
    out.sync_all().map_err(write_err)?;

    tracing::info!(segments = paths.len(), bytes = total, "assembled {}", output.display());
    Ok(total)
}
