//! Blocking HTTP(S) GET helper.
//!
//! Only transport failures are errors. The status code is not inspected, so a
//! 404 or 500 still yields its body.

use std::time::Duration;

use bytes::Bytes;
use reqwest::blocking::Client;

use crate::error::Result;

/// Settings used to build a [`Fetcher`].
#[derive(Debug, Clone, Default)]
pub struct FetcherSettings {
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl FetcherSettings {
    pub fn build(self) -> Result<Fetcher> {
        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(Fetcher { client })
    }
}

/// Reusable GET client. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        FetcherSettings::default().build()
    }

    /// GET `url` and return the full response body.
    pub fn get(&self, url: &str) -> Result<Bytes> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        let status = response.status();
        // `bytes()` consumes the response, so the connection is released on both paths.
        let body = response.bytes()?;
        log::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(body)
    }
}

/// One-shot GET with default settings.
pub fn get(url: &str) -> Result<Bytes> {
    Fetcher::new()?.get(url)
}
