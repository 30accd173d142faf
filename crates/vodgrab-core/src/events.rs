//! Structured progress events emitted by the pipeline.
//!
//! Events are best-effort: they are sent with `try_send`, so a slow or full
//! consumer drops events instead of stalling downloads.

use std::path::PathBuf;

use crate::pipeline::PipelineState;

pub type EventSender = tokio::sync::mpsc::Sender<PipelineEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StateChanged(PipelineState),
    VariantSelected { url: String },
    SegmentsListed { count: usize },
    /// One segment is staged. `completed` counts finished segments so far.
    SegmentFetched {
        index: usize,
        bytes: u64,
        completed: usize,
        total: usize,
    },
    Assembled { path: PathBuf, bytes: u64 },
    StagingRemoved { path: PathBuf },
}

pub(crate) fn emit(tx: Option<&EventSender>, event: PipelineEvent) {
    if let Some(tx) = tx {
        let _ = tx.try_send(event);
    }
}
