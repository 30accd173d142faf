//! Content identifiers and the sources that produce them.
//!
//! The pipeline only needs the identifier string. How it is obtained (given
//! on the command line, read out of a rendered page) is hidden behind
//! `IdentifierSource`.

mod page;

pub use page::{extract_attribute, PageIdentifierSource, PageMode};

use std::fmt;

use crate::control::AbortToken;
use crate::error::PipelineError;

/// Opaque token identifying one video. It names the staging directory and
/// the output file, so it cannot contain path separators or control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentIdentifier(String);

impl ContentIdentifier {
    pub fn new(raw: &str) -> Result<Self, PipelineError> {
        let id = raw.trim();
        let invalid = id.is_empty()
            || id == "."
            || id == ".."
            || id.chars().any(|c| c == '/' || c == '\\' || c.is_control());
        if invalid {
            return Err(PipelineError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces the content identifier for a job.
pub trait IdentifierSource {
    fn identify(&self, abort: &AbortToken) -> Result<ContentIdentifier, PipelineError>;
}

/// Identifier supplied directly by the user.
#[derive(Debug, Clone)]
pub struct FixedIdentifier(pub String);

impl IdentifierSource for FixedIdentifier {
    fn identify(&self, _abort: &AbortToken) -> Result<ContentIdentifier, PipelineError> {
        ContentIdentifier::new(&self.0)
    }
}
