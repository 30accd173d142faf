//! vodgrab core: download a segmented (HLS) video on demand and merge it
//! into one file.
//!
//! The pipeline runs four stages in order: resolve the variant playlist for a
//! content identifier, enumerate its segment URLs, fetch every segment into a
//! staging directory, and concatenate them into the output artifact.

pub mod assembler;
pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod identifier;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod playlist;
pub mod resolver;
pub mod retry;
pub mod staging;
pub mod transport;
pub mod url_model;

pub use error::PipelineError;
