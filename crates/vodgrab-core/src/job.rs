//! One download job: identifier source → pipeline.
//!
//! Front ends call into this module; it picks the identifier source from the
//! job options and treats a failure to obtain an identifier as fatal.

use anyhow::{bail, Context, Result};

use crate::config::{JobOptions, VodgrabConfig};
use crate::control::AbortToken;
use crate::events::EventSender;
use crate::identifier::{ContentIdentifier, FixedIdentifier, IdentifierSource, PageIdentifierSource};
use crate::pipeline::{Pipeline, PipelineOutcome, PipelineSettings};
use crate::playlist;
use crate::resolver;
use crate::transport::Transport;

/// Identifier source for `job`: an explicit identifier wins over the page URL.
pub fn identifier_source<'a>(
    cfg: &VodgrabConfig,
    job: &JobOptions,
    transport: &'a dyn Transport,
) -> Result<Box<dyn IdentifierSource + 'a>> {
    if let Some(id) = &job.identifier {
        return Ok(Box::new(FixedIdentifier(id.clone())));
    }
    match &job.source_page_url {
        Some(page_url) => Ok(Box::new(PageIdentifierSource::new(
            transport,
            page_url,
            &cfg.identifier,
            job.headless_resolution,
        ))),
        None => bail!("either a source page URL or an identifier is required"),
    }
}

/// Obtain the content identifier for `job`.
pub fn identify(
    cfg: &VodgrabConfig,
    job: &JobOptions,
    transport: &dyn Transport,
    abort: &AbortToken,
) -> Result<ContentIdentifier> {
    let source = identifier_source(cfg, job, transport)?;
    let id = source
        .identify(abort)
        .context("could not obtain content identifier")?;
    tracing::info!(identifier = %id, "content identifier");
    Ok(id)
}

/// Selected variant playlist URL and its segment URLs, without downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentListing {
    pub identifier: ContentIdentifier,
    pub variant_url: String,
    pub segment_urls: Vec<String>,
}

/// Resolve and enumerate only.
pub fn list_segments(
    cfg: &VodgrabConfig,
    job: &JobOptions,
    transport: &dyn Transport,
    abort: &AbortToken,
) -> Result<SegmentListing> {
    let identifier = identify(cfg, job, transport, abort)?;
    let policy = cfg.retry_policy();
    let variant_url =
        resolver::resolve_variant(transport, &cfg.manifest_url_template, &identifier, &policy, abort)?;
    let segment_urls = playlist::enumerate_segments(transport, &variant_url, &policy, abort)?;
    Ok(SegmentListing {
        identifier,
        variant_url,
        segment_urls,
    })
}

/// Identify, then run the full pipeline.
pub fn run_job(
    cfg: &VodgrabConfig,
    job: &JobOptions,
    transport: &dyn Transport,
    abort: &AbortToken,
    events: Option<EventSender>,
) -> Result<PipelineOutcome> {
    let id = identify(cfg, job, transport, abort)?;
    let mut pipeline = Pipeline::new(transport, PipelineSettings::new(cfg, job))
        .with_abort(abort.clone())
        .with_events(events);
    let outcome = pipeline
        .run(&id)
        .with_context(|| format!("download of {} failed", id))?;
    Ok(outcome)
}
