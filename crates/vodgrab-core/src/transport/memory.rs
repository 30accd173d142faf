//! In-memory transport for unit tests: scripted bodies, failures and delays.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use super::Transport;
use crate::control::AbortToken;
use crate::retry::FetchError;

#[derive(Debug, Clone, Default)]
pub(crate) struct Route {
    pub body: Vec<u8>,
    /// Status returned for the first `fail_times` requests.
    pub fail_status: u32,
    pub fail_times: u32,
    /// Fail every request with `fail_status`.
    pub always_fail: bool,
    pub delay: Duration,
    /// Set the caller's abort token and fail as an aborted transfer.
    pub abort_on_request: bool,
}

#[derive(Default)]
pub(crate) struct MemoryTransport {
    routes: HashMap<String, Route>,
    hits: Mutex<HashMap<String, u32>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                body: body.into(),
                ..Route::default()
            },
        );
        self
    }

    pub fn with_route(mut self, url: &str, route: Route) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    /// Number of requests made for `url`.
    pub fn hits(&self, url: &str) -> u32 {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn respond(&self, url: &str, abort: &AbortToken) -> Result<Vec<u8>, FetchError> {
        let attempt = {
            let mut hits = self.hits.lock().unwrap();
            let n = hits.entry(url.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        let route = self.routes.get(url).ok_or(FetchError::Http(404))?;
        if !route.delay.is_zero() {
            std::thread::sleep(route.delay);
        }
        if route.abort_on_request {
            abort.abort();
            return Err(FetchError::Aborted);
        }
        if abort.is_aborted() {
            return Err(FetchError::Aborted);
        }
        if route.always_fail || attempt <= route.fail_times {
            return Err(FetchError::Http(route.fail_status));
        }
        Ok(route.body.clone())
    }
}

impl Transport for MemoryTransport {
    fn get_text(&self, url: &str, abort: &AbortToken) -> Result<String, FetchError> {
        let body = self.respond(url, abort)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn download_to(&self, url: &str, dest: &Path, abort: &AbortToken) -> Result<u64, FetchError> {
        let body = self.respond(url, abort)?;
        std::fs::write(dest, &body).map_err(FetchError::Storage)?;
        Ok(body.len() as u64)
    }
}
