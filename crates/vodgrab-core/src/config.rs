use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::DEFAULT_MANIFEST_URL_TEMPLATE;
use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Curl transfer limits shared by every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/sec for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// Hard wall-clock limit per transfer.
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            timeout_secs: 3600,
            user_agent: None,
        }
    }
}

/// How the source page is loaded before looking for the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFetch {
    /// Render with `browser_command` so script-built elements exist.
    Browser,
    /// Plain GET; only works for pages that ship the element in their HTML.
    Http,
}

/// Where and how to find the content identifier on the source page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// `id` of the element that carries the identifier.
    pub element_id: String,
    /// Attribute holding the identifier.
    pub attribute: String,
    /// How long to keep polling the page before giving up. Also bounds each
    /// browser run.
    pub wait_secs: u64,
    pub poll_interval_ms: u64,
    pub fetch: PageFetch,
    pub browser_command: String,
    /// Passed on every browser run, before the page URL. The browser must
    /// print the rendered DOM to stdout.
    pub browser_args: Vec<String>,
    /// Added with `--headless`: the lightweight headless shell.
    pub headless_args: Vec<String>,
    /// Added without `--headless`: the full browser. Chromium only honours
    /// `--dump-dom` in a headless variant, so the default runs the full
    /// browser engine without a window.
    pub headed_args: Vec<String>,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            element_id: "movie-area-detail".to_string(),
            attribute: "data-id".to_string(),
            wait_secs: 30,
            poll_interval_ms: 1000,
            fetch: PageFetch::Browser,
            browser_command: "chromium".to_string(),
            browser_args: vec![
                "--virtual-time-budget=10000".to_string(),
                "--dump-dom".to_string(),
            ],
            headless_args: vec!["--headless".to_string(), "--disable-gpu".to_string()],
            headed_args: vec!["--headless=new".to_string()],
        }
    }
}

impl IdentifierConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Browser arguments (without the page URL) for the requested mode.
    pub fn browser_args_for(&self, headless: bool) -> Vec<String> {
        let mode = if headless {
            &self.headless_args
        } else {
            &self.headed_args
        };
        mode.iter().chain(&self.browser_args).cloned().collect()
    }
}

/// Global configuration loaded from `~/.config/vodgrab/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VodgrabConfig {
    /// Maximum number of segment downloads in flight at once.
    pub max_concurrent_segments: usize,
    /// Variant manifest URL; `{id}` is replaced by the content identifier.
    pub manifest_url_template: String,
    /// Extension of the merged output file.
    pub output_extension: String,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub identifier: IdentifierConfig,
}

impl Default for VodgrabConfig {
    fn default() -> Self {
        Self {
            max_concurrent_segments: 8,
            manifest_url_template: DEFAULT_MANIFEST_URL_TEMPLATE.to_string(),
            output_extension: "ts".to_string(),
            retry: None,
            http: HttpConfig::default(),
            identifier: IdentifierConfig::default(),
        }
    }
}

impl VodgrabConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }
}

/// Per-run options, normally filled from the command line.
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    /// Page that embeds the video; used when `identifier` is not given.
    pub source_page_url: Option<String>,
    /// Identifier supplied directly, skipping page resolution.
    pub identifier: Option<String>,
    /// Directory for the staging folder and output file (default: current dir).
    pub output_dir: Option<PathBuf>,
    /// Stop after fetching; keep the individual segment files.
    pub skip_merge: bool,
    /// Use the headless browser shell instead of the full browser for page rendering.
    pub headless_resolution: bool,
    /// Keep the staging directory after a successful merge.
    pub keep_staging: bool,
    /// Replace an existing output file instead of failing.
    pub overwrite: bool,
    /// Overrides `max_concurrent_segments` for this run.
    pub max_concurrent: Option<usize>,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vodgrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VodgrabConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VodgrabConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: VodgrabConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
