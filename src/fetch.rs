//! Outbound HTTP, wrapped behind the [`PageFetcher`] seam.
//!
//! Everything that crosses the network goes through here: article pages and
//! image downloads. Both are bounded by timeouts and retried per
//! [`RetryPolicy`]; callers treat failures as "no result", never as fatal.

use std::time::Duration;

use anyhow::{Context, ensure};

use crate::Result;
use crate::retry::RetryPolicy;

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("newsreel/", env!("CARGO_PKG_VERSION"));

/// Article pages are small; give up quickly.
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Image downloads can be a few megabytes; allow a little longer.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Pluggable page and byte fetching.
pub trait PageFetcher {
    /// Fetch a page body as text.
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetch a resource as raw bytes.
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher used outside of tests.
///
/// Two clients because the two kinds of request want different timeouts.
/// This is the only type in the crate that sleeps.
pub struct HttpFetcher {
    page_client: reqwest::blocking::Client,
    download_client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_retry(RetryPolicy::default())
    }

    pub fn with_retry(retry: RetryPolicy) -> Result<Self> {
        Ok(Self::build(retry)?)
    }

    fn build(retry: RetryPolicy) -> anyhow::Result<Self> {
        let page_client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PAGE_TIMEOUT)
            .build()
            .context("failed to build the page HTTP client")?;
        let download_client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .context("failed to build the download HTTP client")?;
        Ok(Self {
            page_client,
            download_client,
            retry,
        })
    }

    fn get(
        &self,
        client: &reqwest::blocking::Client,
        url: &str,
    ) -> anyhow::Result<reqwest::blocking::Response> {
        self.retry.run(|| {
            let response = client
                .get(url)
                .send()
                .with_context(|| format!("request to '{url}' failed"))?;
            ensure!(
                response.status().is_success(),
                "request to '{url}' returned status {}",
                response.status()
            );
            Ok(response)
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(&self.page_client, url)?;
        Ok(response
            .text()
            .with_context(|| format!("failed to read the body of '{url}'"))?)
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(&self.download_client, url)?;
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read the bytes of '{url}'"))?;
        Ok(bytes.to_vec())
    }
}
