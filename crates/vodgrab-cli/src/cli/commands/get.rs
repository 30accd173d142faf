//! `vodgrab get` – download one video.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Instant;
use vodgrab_core::config::{JobOptions, VodgrabConfig};
use vodgrab_core::events::PipelineEvent;
use vodgrab_core::job;
use vodgrab_core::pipeline::PipelineOutcome;

use super::{abort_on_ctrl_c, blocking, transport_for};

/// Flags of the `get` subcommand.
#[derive(Debug, Clone, Default)]
pub struct GetArgs {
    pub page_url: Option<String>,
    pub id: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub no_merge: bool,
    pub headless: bool,
    pub keep_staging: bool,
    pub overwrite: bool,
    pub jobs: Option<usize>,
}

impl GetArgs {
    pub fn into_job(self) -> JobOptions {
        JobOptions {
            source_page_url: self.page_url,
            identifier: self.id,
            output_dir: self.output_dir,
            skip_merge: self.no_merge,
            headless_resolution: self.headless,
            keep_staging: self.keep_staging,
            overwrite: self.overwrite,
            max_concurrent: self.jobs,
        }
    }
}

const PROGRESS_INTERVAL_MS: u64 = 500;

pub async fn run_get(cfg: VodgrabConfig, job: JobOptions) -> Result<()> {
    let abort = abort_on_ctrl_c();
    let started = Instant::now();

    let (events_tx, mut events_rx) = tokio::sync::mpsc::channel::<PipelineEvent>(64);
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        let mut bytes_done = 0u64;
        while let Some(ev) = events_rx.recv().await {
            match ev {
                PipelineEvent::StateChanged(state) => tracing::debug!("state: {}", state),
                PipelineEvent::VariantSelected { url } => println!("playlist: {}", url),
                PipelineEvent::SegmentsListed { count } => println!("{} segment(s)", count),
                PipelineEvent::SegmentFetched {
                    bytes,
                    completed,
                    total,
                    ..
                } => {
                    bytes_done += bytes;
                    let now = Instant::now();
                    if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                        || completed == total
                    {
                        let pct = completed as f64 / total.max(1) as f64 * 100.0;
                        println!(
                            "  {} / {} segments ({:.1}%)  {:.1} MiB",
                            completed,
                            total,
                            pct,
                            bytes_done as f64 / 1_048_576.0
                        );
                        last_print = now;
                    }
                }
                PipelineEvent::Assembled { path, bytes } => {
                    println!("merged {:.1} MiB into {}", bytes as f64 / 1_048_576.0, path.display())
                }
                PipelineEvent::StagingRemoved { path } => {
                    tracing::debug!("removed staging {}", path.display())
                }
            }
        }
    });

    let worker_abort = abort.clone();
    let result = blocking(move || {
        let transport = transport_for(&cfg);
        job::run_job(&cfg, &job, &transport, &worker_abort, Some(events_tx))
    })
    .await;
    let _ = progress_handle.await;

    let elapsed = started.elapsed();
    tracing::info!("finished in {:.1}s", elapsed.as_secs_f64());
    match result? {
        PipelineOutcome::Merged { output, segments, .. } => {
            println!("{} ({} segments, {:.1}s)", output.display(), segments, elapsed.as_secs_f64());
        }
        PipelineOutcome::Staged { staging_dir, files } => {
            println!(
                "{} segment(s) kept in {} ({:.1}s)",
                files.len(),
                staging_dir.display(),
                elapsed.as_secs_f64()
            );
        }
    }
    Ok(())
}
