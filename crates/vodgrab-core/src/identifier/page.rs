//! Identifier read from an attribute of an element on the source page.
//!
//! The page builds the player element with script after load, so the source
//! polls: fetch (or render) the page, look for the element, and try again
//! until the wait bound runs out.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use regex::Regex;

use super::{ContentIdentifier, IdentifierSource};
use crate::config::{IdentifierConfig, PageFetch};
use crate::control::AbortToken;
use crate::error::PipelineError;
use crate::retry::sleep_unless_aborted;
use crate::transport::Transport;

const CHILD_POLL: Duration = Duration::from_millis(50);

/// How the page markup is obtained.
#[derive(Debug, Clone)]
pub enum PageMode {
    /// Plain GET through the transport (server-rendered pages only).
    Http,
    /// Run a browser that prints the rendered DOM to stdout.
    /// The page URL is appended after `args`.
    Browser { command: String, args: Vec<String> },
}

pub struct PageIdentifierSource<'a> {
    transport: &'a dyn Transport,
    page_url: String,
    mode: PageMode,
    element_id: String,
    attribute: String,
    wait: Duration,
    poll_interval: Duration,
}

impl<'a> PageIdentifierSource<'a> {
    /// `headless` picks between the headless shell and the full browser; it
    /// has no effect when the config selects plain HTTP.
    pub fn new(transport: &'a dyn Transport, page_url: &str, cfg: &IdentifierConfig, headless: bool) -> Self {
        let mode = match cfg.fetch {
            PageFetch::Browser => PageMode::Browser {
                command: cfg.browser_command.clone(),
                args: cfg.browser_args_for(headless),
            },
            PageFetch::Http => {
                if headless {
                    tracing::debug!("page fetch is plain HTTP; --headless ignored");
                }
                PageMode::Http
            }
        };
        Self {
            transport,
            page_url: page_url.to_string(),
            mode,
            element_id: cfg.element_id.clone(),
            attribute: cfg.attribute.clone(),
            wait: cfg.wait(),
            poll_interval: cfg.poll_interval(),
        }
    }

    pub fn with_mode(mut self, mode: PageMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> &PageMode {
        &self.mode
    }

    pub fn with_wait(mut self, wait: Duration, poll_interval: Duration) -> Self {
        self.wait = wait;
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    /// Page markup, or `None` when the browser was still running at `deadline`.
    fn fetch_page(&self, deadline: Instant, abort: &AbortToken) -> Result<Option<String>, PipelineError> {
        match &self.mode {
            PageMode::Http => self
                .transport
                .get_text(&self.page_url, abort)
                .map(Some)
                .map_err(|e| PipelineError::from_fetch(&self.page_url, None, e)),
            PageMode::Browser { command, args } => {
                render_with_browser(command, args, &self.page_url, deadline, abort)
            }
        }
    }
}

impl IdentifierSource for PageIdentifierSource<'_> {
    fn identify(&self, abort: &AbortToken) -> Result<ContentIdentifier, PipelineError> {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.wait)
            .unwrap_or_else(|| started + Duration::from_secs(365 * 24 * 3600));
        let mut polls = 0u32;
        loop {
            if abort.is_aborted() {
                return Err(PipelineError::Cancelled);
            }
            polls += 1;
            match self.fetch_page(deadline, abort) {
                Ok(Some(html)) => {
                    if let Some(raw) = extract_attribute(&html, &self.element_id, &self.attribute) {
                        tracing::debug!(polls, "found identifier on {}", self.page_url);
                        return ContentIdentifier::new(&raw);
                    }
                    tracing::debug!(polls, "#{} not on page yet", self.element_id);
                }
                Ok(None) => tracing::warn!("browser still rendering {} at the wait bound", self.page_url),
                Err(e @ (PipelineError::Browser { .. } | PipelineError::Cancelled)) => return Err(e),
                Err(e) => tracing::warn!("page fetch failed, will poll again: {}", e),
            }

            let elapsed = started.elapsed();
            if elapsed >= self.wait {
                return Err(PipelineError::NotFound {
                    page_url: self.page_url.clone(),
                    waited: elapsed,
                });
            }
            if !sleep_unless_aborted(self.poll_interval.min(self.wait - elapsed), abort) {
                return Err(PipelineError::Cancelled);
            }
        }
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Run the browser and collect its stdout. The child is killed on abort, on
/// a wait error and when `deadline` passes (`Ok(None)`).
fn render_with_browser(
    command: &str,
    args: &[String],
    page_url: &str,
    deadline: Instant,
    abort: &AbortToken,
) -> Result<Option<String>, PipelineError> {
    let browser_err = |source: std::io::Error| PipelineError::Browser {
        command: command.to_string(),
        source,
    };

    let mut child = Command::new(command)
        .args(args)
        .arg(page_url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(browser_err)?;

    let Some(mut stdout) = child.stdout.take() else {
        kill_and_reap(&mut child);
        return Err(browser_err(std::io::Error::new(std::io::ErrorKind::Other, "no stdout pipe")));
    };
    // Drain stdout on its own thread so a large DOM cannot block the child.
    // Not joined after a kill: browser helper processes may keep the pipe open.
    let reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });

    let status = loop {
        if abort.is_aborted() {
            kill_and_reap(&mut child);
            return Err(PipelineError::Cancelled);
        }
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let now = Instant::now();
                if now >= deadline {
                    tracing::debug!("killing browser `{}` at the wait bound", command);
                    kill_and_reap(&mut child);
                    return Ok(None);
                }
                std::thread::sleep(CHILD_POLL.min(deadline - now));
            }
            Err(e) => {
                kill_and_reap(&mut child);
                return Err(browser_err(e));
            }
        }
    };
    if !status.success() {
        tracing::warn!("browser `{}` exited with {}", command, status);
    }

    let out = reader
        .join()
        .map_err(|_| browser_err(std::io::Error::new(std::io::ErrorKind::Other, "stdout reader panicked")))?
        .map_err(browser_err)?;
    Ok(Some(String::from_utf8_lossy(&out).into_owned()))
}

/// Value of `attribute` on the first tag whose `id` is `element_id`.
/// Returns `None` when the element is absent or the value is blank.
pub fn extract_attribute(html: &str, element_id: &str, attribute: &str) -> Option<String> {
    let tag_re = Regex::new(&format!(
        r#"(?is)<[a-z][^>]*?\sid\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(element_id)
    ))
    .ok()?;
    let attr_re = Regex::new(&format!(
        r#"(?is)\s{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(attribute)
    ))
    .ok()?;

    let tag = tag_re.find(html)?.as_str();
    let caps = attr_re.captures(tag)?;
    let value = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
