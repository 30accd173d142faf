//! Pipeline error taxonomy.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::retry::FetchError;

/// Failure of any pipeline stage. Every variant is fatal to the run; staged
/// segments and a partially written output are left on disk for inspection.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fetch failed or returned a non-success status (after retries).
    #[error("network request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The variant manifest had no usable lines.
    #[error("variant manifest at {url} is empty")]
    EmptyManifest { url: String },

    /// The media playlist listed no segment URLs.
    #[error("media playlist at {url} lists no segments")]
    EmptySegmentList { url: String },

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The identifier source produced nothing within its wait bound.
    #[error("no content identifier found on {page_url} within {}s", waited.as_secs())]
    NotFound { page_url: String, waited: Duration },

    /// The page-rendering browser could not be launched.
    #[error("failed to launch browser `{command}`: {source}")]
    Browser {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid content identifier {0:?}")]
    InvalidIdentifier(String),

    /// Merging would append onto an artifact from an earlier run.
    #[error("output {} already exists; use --overwrite to replace it", path.display())]
    OutputExists { path: PathBuf },

    /// A segment download failed; `index` is its 0-based playlist position.
    #[error("segment {index} ({url}) failed: {source}")]
    Segment {
        index: usize,
        url: String,
        #[source]
        source: Box<PipelineError>,
    },

    /// A worker exited without reporting a result for a segment.
    #[error("segment {index} produced no result")]
    WorkerLost { index: usize },

    #[error("pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Attribute a transport failure to `url`. Aborts become `Cancelled` and
    /// storage failures become `FileWrite` on `path`.
    pub(crate) fn from_fetch(url: &str, path: Option<&std::path::Path>, e: FetchError) -> Self {
        match e {
            FetchError::Aborted => PipelineError::Cancelled,
            FetchError::Storage(source) => match path {
                Some(p) => PipelineError::FileWrite {
                    path: p.to_path_buf(),
                    source,
                },
                None => PipelineError::Network {
                    url: url.to_string(),
                    source: FetchError::Storage(source),
                },
            },
            other => PipelineError::Network {
                url: url.to_string(),
                source: other,
            },
        }
    }

    /// Index of the failed segment, if this error came from the fetcher.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            PipelineError::Segment { index, .. } | PipelineError::WorkerLost { index } => Some(*index),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
