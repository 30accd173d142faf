//! `vodgrab segments` – print the selected playlist and its segment URLs.

use anyhow::Result;
use vodgrab_core::config::{JobOptions, VodgrabConfig};
use vodgrab_core::job;

use super::{abort_on_ctrl_c, blocking, transport_for};

pub async fn run_segments(
    cfg: VodgrabConfig,
    page_url: Option<String>,
    id: Option<String>,
    headless: bool,
) -> Result<()> {
    let abort = abort_on_ctrl_c();
    let job = JobOptions {
        source_page_url: page_url,
        identifier: id,
        headless_resolution: headless,
        ..JobOptions::default()
    };
    let listing = blocking(move || {
        let transport = transport_for(&cfg);
        job::list_segments(&cfg, &job, &transport, &abort)
    })
    .await?;

    println!("# identifier: {}", listing.identifier);
    println!("# playlist: {}", listing.variant_url);
    if listing.segment_urls.is_empty() {
        println!("# no segments");
    }
    for url in &listing.segment_urls {
        println!("{}", url);
    }
    Ok(())
}
