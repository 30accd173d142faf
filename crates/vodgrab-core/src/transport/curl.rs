//! Transport backed by libcurl (`curl` crate, easy interface).

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use super::Transport;
use crate::config::HttpConfig;
use crate::control::AbortToken;
use crate::retry::FetchError;

/// Per-transfer curl settings.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for CurlOptions {
    fn from(cfg: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_limit: cfg.low_speed_limit,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// Blocking curl transport. A fresh easy handle is used per request, so the
/// connection is closed once each transfer completes.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        // Abort stalled transfers instead of relying only on the hard timeout.
        easy.low_speed_limit(self.opts.low_speed_limit)?;
        easy.low_speed_time(self.opts.low_speed_time)?;
        easy.timeout(self.opts.timeout)?;
        if let Some(ua) = &self.opts.user_agent {
            easy.useragent(ua)?;
        }
        // Needed for the progress callback that observes the abort token.
        easy.progress(true)?;
        Ok(easy)
    }
}

/// Map a failed `perform` to a fetch error, preferring abort and storage causes.
fn perform_error(e: curl::Error, abort: &AbortToken, write_err: Option<std::io::Error>) -> FetchError {
    if abort.is_aborted() || e.is_aborted_by_callback() {
        return FetchError::Aborted;
    }
    if e.is_write_error() {
        if let Some(io) = write_err {
            return FetchError::Storage(io);
        }
    }
    FetchError::Curl(e)
}

fn check_status(easy: &mut curl::easy::Easy) -> Result<(), FetchError> {
    let code = easy.response_code().map_err(FetchError::Curl)?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }
    Ok(())
}

impl Transport for CurlTransport {
    fn get_text(&self, url: &str, abort: &AbortToken) -> Result<String, FetchError> {
        if abort.is_aborted() {
            return Err(FetchError::Aborted);
        }
        let mut easy = self.easy(url).map_err(FetchError::Curl)?;
        let mut body: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(FetchError::Curl)?;
            transfer
                .progress_function(|_, _, _, _| !abort.is_aborted())
                .map_err(FetchError::Curl)?;
            if let Err(e) = transfer.perform() {
                return Err(perform_error(e, abort, None));
            }
        }
        check_status(&mut easy)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn download_to(&self, url: &str, dest: &Path, abort: &AbortToken) -> Result<u64, FetchError> {
        if abort.is_aborted() {
            return Err(FetchError::Aborted);
        }
        let mut easy = self.easy(url).map_err(FetchError::Curl)?;
        let mut file = File::create(dest).map_err(FetchError::Storage)?;
        let mut written = 0u64;
        let mut write_err: Option<std::io::Error> = None;
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match file.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        write_err = Some(e);
                        // Short count makes curl abort with a write error.
                        Ok(0)
                    }
                })
                .map_err(FetchError::Curl)?;
            transfer
                .progress_function(|_, _, _, _| !abort.is_aborted())
                .map_err(FetchError::Curl)?;
            let res = transfer.perform();
            drop(transfer);
            if let Err(e) = res {
                return Err(perform_error(e, abort, write_err.take()));
            }
        }
        check_status(&mut easy)?;
        file.flush().map_err(FetchError::Storage)?;
        Ok(written)
    }
}
