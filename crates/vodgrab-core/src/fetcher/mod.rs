//! Segment fetcher: ordered segment URLs → ordered staged files.
//!
//! Runs a bounded pool of worker threads over an index-ordered work queue.
//! Each segment is retried independently; results come back over a channel
//! in completion order and are written into a slot-indexed buffer, so the
//! returned paths always follow playlist order.

mod segment;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};

use crate::control::AbortToken;
use crate::error::PipelineError;
use crate::events::{emit, EventSender, PipelineEvent};
use crate::retry::RetryPolicy;
use crate::staging;
use crate::transport::Transport;
use crate::url_model::plan_segment_file_names;

/// Concurrency and retry settings for one fetch run.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Maximum segment downloads in flight (at least 1).
    pub max_concurrent: usize,
    pub retry_policy: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Downloads every URL into `staging_dir` and returns the local paths in the
/// same order as `urls`.
///
/// Fail-fast: after the first unrecoverable failure no new segments are
/// started. The error is `PipelineError::Segment` for the lowest failed index
/// seen, or `Cancelled` if `abort` fired. Segments finished before the failure
/// stay on disk.
pub fn fetch_all(
    transport: &dyn Transport,
    urls: &[String],
    staging_dir: &Path,
    opts: &FetchOptions,
    abort: &AbortToken,
    events: Option<&EventSender>,
) -> Result<Vec<PathBuf>, PipelineError> {
    staging::ensure_dir(staging_dir)?;
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let total = urls.len();
    let dests: Vec<PathBuf> = plan_segment_file_names(urls)
        .into_iter()
        .map(|name| staging_dir.join(name))
        .collect();

    let work: Mutex<VecDeque<usize>> = Mutex::new((0..total).collect());
    let stop = AtomicBool::new(false);
    let num_workers = opts.max_concurrent.max(1).min(total);
    tracing::info!(
        segments = total,
        workers = num_workers,
        "fetching segments into {}",
        staging_dir.display()
    );

    let mut slots: Vec<Option<PathBuf>> = vec![None; total];
    let mut failure: Option<(usize, PipelineError)> = None;
    let mut completed = 0usize;

    std::thread::scope(|scope| {
        let (tx, rx) = mpsc::channel::<(usize, Result<u64, PipelineError>)>();
        for _ in 0..num_workers {
            let tx = tx.clone();
            let work = &work;
            let stop = &stop;
            let dests = &dests;
            scope.spawn(move || loop {
                if stop.load(Ordering::Relaxed) || abort.is_aborted() {
                    break;
                }
                let next = match work.lock() {
                    Ok(mut q) => q.pop_front(),
                    Err(_) => None,
                };
                let Some(index) = next else {
                    break;
                };
                let res = segment::download_segment(
                    transport,
                    &urls[index],
                    &dests[index],
                    &opts.retry_policy,
                    abort,
                );
                if res.is_err() {
                    stop.store(true, Ordering::Relaxed);
                }
                if tx.send((index, res)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        // Ends once every worker has exited and dropped its sender.
        for (index, res) in rx {
            match res {
                Ok(bytes) => {
                    completed += 1;
                    tracing::debug!(index, bytes, "segment {}/{} staged", completed, total);
                    slots[index] = Some(dests[index].clone());
                    emit(
                        events,
                        PipelineEvent::SegmentFetched {
                            index,
                            bytes,
                            completed,
                            total,
                        },
                    );
                }
                Err(e) => {
                    if !e.is_cancelled() {
                        tracing::warn!(index, "segment failed: {}", e);
                    }
                    let lower = failure.as_ref().map_or(true, |(i, _)| index < *i);
                    if lower {
                        failure = Some((index, e));
                    }
                }
            }
        }
    });

    if abort.is_aborted() {
        return Err(PipelineError::Cancelled);
    }
    if let Some((index, e)) = failure {
        if e.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        return Err(PipelineError::Segment {
            index,
            url: urls[index].clone(),
            source: Box::new(e),
        });
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or(PipelineError::WorkerLost { index }))
        .collect()
}

#[cfg(test)]
mod tests;
