//! `vodgrab id` – print the identifier found on a page.

use anyhow::Result;
use vodgrab_core::config::{JobOptions, VodgrabConfig};
use vodgrab_core::job;

use super::{abort_on_ctrl_c, blocking, transport_for};

pub async fn run_id(cfg: VodgrabConfig, page_url: String, headless: bool) -> Result<()> {
    let abort = abort_on_ctrl_c();
    let job = JobOptions {
        source_page_url: Some(page_url),
        headless_resolution: headless,
        ..JobOptions::default()
    };
    let id = blocking(move || {
        let transport = transport_for(&cfg);
        job::identify(&cfg, &job, &transport, &abort)
    })
    .await?;
    println!("{}", id);
    Ok(())
}
