//! Pipeline coordinator: resolve → enumerate → fetch → assemble.
//!
//! Stages run strictly in order, each consuming the previous stage's output.
//! Any stage failure moves the coordinator to `Failed` and ends the run with
//! no compensating action: staged segments and a partial output stay on disk.

mod state;

pub use state::PipelineState;

use std::path::PathBuf;

use crate::assembler;
use crate::config::{JobOptions, VodgrabConfig};
use crate::control::AbortToken;
use crate::error::PipelineError;
use crate::events::{emit, EventSender, PipelineEvent};
use crate::fetcher::{self, FetchOptions};
use crate::identifier::ContentIdentifier;
use crate::playlist;
use crate::resolver;
use crate::staging;
use crate::transport::Transport;

/// Everything the coordinator needs besides the identifier.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub manifest_url_template: String,
    pub output_dir: PathBuf,
    pub output_extension: String,
    /// Stop after fetching and keep the segment files as the deliverable.
    pub skip_merge: bool,
    /// Keep the staging directory after a successful merge.
    pub keep_staging: bool,
    /// Replace an existing output artifact instead of failing.
    pub overwrite: bool,
    pub fetch: FetchOptions,
}

impl PipelineSettings {
    pub fn new(cfg: &VodgrabConfig, job: &JobOptions) -> Self {
        Self {
            manifest_url_template: cfg.manifest_url_template.clone(),
            output_dir: job.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            output_extension: cfg.output_extension.clone(),
            skip_merge: job.skip_merge,
            keep_staging: job.keep_staging,
            overwrite: job.overwrite,
            fetch: FetchOptions {
                max_concurrent: job.max_concurrent.unwrap_or(cfg.max_concurrent_segments).max(1),
                retry_policy: cfg.retry_policy(),
            },
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Segments were merged into `output`.
    Merged {
        output: PathBuf,
        bytes: u64,
        segments: usize,
    },
    /// Merging was skipped; the staged files are the deliverable.
    Staged {
        staging_dir: PathBuf,
        files: Vec<PathBuf>,
    },
}

pub struct Pipeline<'a> {
    transport: &'a dyn Transport,
    settings: PipelineSettings,
    abort: AbortToken,
    events: Option<EventSender>,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    pub fn new(transport: &'a dyn Transport, settings: PipelineSettings) -> Self {
        Self {
            transport,
            settings,
            abort: AbortToken::new(),
            events: None,
            state: PipelineState::Idle,
        }
    }

    pub fn with_abort(mut self, abort: AbortToken) -> Self {
        self.abort = abort;
        self
    }

    pub fn with_events(mut self, events: Option<EventSender>) -> Self {
        self.events = events;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run all stages for `id`. A finished pipeline may be run again; it
    /// starts over from `Idle`.
    pub fn run(&mut self, id: &ContentIdentifier) -> Result<PipelineOutcome, PipelineError> {
        self.state = PipelineState::Idle;
        let res = self.run_stages(id);
        if let Err(e) = &res {
            tracing::error!(state = %self.state, "pipeline failed: {}", e);
            if !self.state.is_terminal() {
                self.transition(PipelineState::Failed);
            }
        }
        res
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!("pipeline: {} -> {}", self.state, next);
        self.state = next;
        emit(self.events.as_ref(), PipelineEvent::StateChanged(next));
    }

    fn check_abort(&self) -> Result<(), PipelineError> {
        if self.abort.is_aborted() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    fn run_stages(&mut self, id: &ContentIdentifier) -> Result<PipelineOutcome, PipelineError> {
        let policy = self.settings.fetch.retry_policy;

        self.check_abort()?;
        self.transition(PipelineState::ResolvingPlaylist);
        let variant = resolver::resolve_variant(
            self.transport,
            &self.settings.manifest_url_template,
            id,
            &policy,
            &self.abort,
        )?;
        emit(
            self.events.as_ref(),
            PipelineEvent::VariantSelected { url: variant.clone() },
        );

        self.check_abort()?;
        self.transition(PipelineState::Enumerating);
        let urls = playlist::enumerate_segments(self.transport, &variant, &policy, &self.abort)?;
        if urls.is_empty() {
            return Err(PipelineError::EmptySegmentList { url: variant });
        }
        emit(
            self.events.as_ref(),
            PipelineEvent::SegmentsListed { count: urls.len() },
        );

        let output = staging::output_path(&self.settings.output_dir, id, &self.settings.output_extension);
        if !self.settings.skip_merge && output.exists() && !self.settings.overwrite {
            return Err(PipelineError::OutputExists { path: output });
        }

        self.check_abort()?;
        self.transition(PipelineState::Fetching);
        let staging_dir = staging::staging_dir(&self.settings.output_dir, id);
        let files = fetcher::fetch_all(
            self.transport,
            &urls,
            &staging_dir,
            &self.settings.fetch,
            &self.abort,
            self.events.as_ref(),
        )?;

        if self.settings.skip_merge {
            tracing::info!("merge skipped; {} segment(s) kept in {}", files.len(), staging_dir.display());
            self.transition(PipelineState::Done);
            return Ok(PipelineOutcome::Staged { staging_dir, files });
        }

        self.check_abort()?;
        self.transition(PipelineState::Assembling);
        if output.exists() {
            // Only reachable with `overwrite`; never append onto an old artifact.
            std::fs::remove_file(&output).map_err(|source| PipelineError::FileWrite {
                path: output.clone(),
                source,
            })?;
        }
        let bytes = assembler::assemble(&files, &output)?;
        emit(
            self.events.as_ref(),
            PipelineEvent::Assembled {
                path: output.clone(),
                bytes,
            },
        );

        if !self.settings.keep_staging {
            match staging::remove_staging(&staging_dir) {
                Ok(()) => emit(
                    self.events.as_ref(),
                    PipelineEvent::StagingRemoved {
                        path: staging_dir.clone(),
                    },
                ),
                Err(e) => tracing::warn!("could not remove {}: {}", staging_dir.display(), e),
            }
        }

        self.transition(PipelineState::Done);
        Ok(PipelineOutcome::Merged {
            output,
            bytes,
            segments: files.len(),
        })
    }
}
