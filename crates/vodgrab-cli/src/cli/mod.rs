//! CLI for vodgrab.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vodgrab_core::config;

use commands::{run_get, run_id, run_segments, GetArgs};

/// Top-level CLI for vodgrab.
#[derive(Debug, Parser)]
#[command(name = "vodgrab")]
#[command(about = "vodgrab: download a segmented video on demand and merge it into one file", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a video: find its identifier, fetch every segment and merge them.
    Get {
        /// Page that embeds the player; the identifier is read from it.
        #[arg(required_unless_present = "id")]
        page_url: Option<String>,
        /// Use this content identifier instead of reading it from a page.
        #[arg(long, conflicts_with = "page_url")]
        id: Option<String>,
        /// Directory for the staging folder and the merged file (default: current dir).
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Keep the downloaded segments and do not merge them.
        #[arg(long)]
        no_merge: bool,
        /// Render the page with the lightweight headless browser shell instead of the full browser.
        #[arg(long)]
        headless: bool,
        /// Keep the staging folder after a successful merge.
        #[arg(long)]
        keep_staging: bool,
        /// Replace an existing output file.
        #[arg(long)]
        overwrite: bool,
        /// Download up to N segments at once (default from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Print the content identifier found on a page.
    Id {
        /// Page that embeds the player.
        page_url: String,
        /// Render the page with the lightweight headless browser shell.
        #[arg(long)]
        headless: bool,
    },

    /// Print the selected variant playlist and its segment URLs without downloading.
    Segments {
        /// Page that embeds the player.
        #[arg(required_unless_present = "id")]
        page_url: Option<String>,
        /// Use this content identifier instead of reading it from a page.
        #[arg(long, conflicts_with = "page_url")]
        id: Option<String>,
        /// Render the page with the lightweight headless browser shell.
        #[arg(long)]
        headless: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                page_url,
                id,
                output_dir,
                no_merge,
                headless,
                keep_staging,
                overwrite,
                jobs,
            } => {
                let args = GetArgs {
                    page_url,
                    id,
                    output_dir,
                    no_merge,
                    headless,
                    keep_staging,
                    overwrite,
                    jobs,
                };
                run_get(cfg, args.into_job()).await?;
            }
            CliCommand::Id { page_url, headless } => run_id(cfg, page_url, headless).await?,
            CliCommand::Segments {
                page_url,
                id,
                headless,
            } => run_segments(cfg, page_url, id, headless).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
