//! HTTP content fetcher
//!
//! Plain GET against the site URL with a bounded timeout. The body is read
//! chunk by chunk and refused once it outgrows what a ConfigMap can hold.

use crate::error::FetchError;
use crate::fetcher_trait::ContentFetcherTrait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// Largest body accepted; a ConfigMap holds at most 1 MiB in total.
pub const MAX_CONTENT_BYTES: usize = 1024 * 1024 - 4 * 1024;

/// Document retrieved from a site URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    /// URL the content was requested from
    pub url: String,
    /// Response body decoded as UTF-8 (lossy)
    pub body: String,
}

/// reqwest-backed content fetcher
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    timeout: Duration,
}

impl ContentFetcher {
    /// Create a new fetcher
    ///
    /// # Arguments
    /// * `timeout` - Upper bound for a whole request, connect included
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dummysite-controller/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, timeout })
    }

    fn parse_url(url: &str) -> Result<Url, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }

    fn map_transport_error(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }
        } else {
            FetchError::Http(error)
        }
    }
}

#[async_trait::async_trait]
impl ContentFetcherTrait for ContentFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let parsed = Self::parse_url(url)?;
        debug!("Fetching site content from {}", parsed);

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            limit: MAX_CONTENT_BYTES,
        };

        if response
            .content_length()
            .is_some_and(|len| len > MAX_CONTENT_BYTES as u64)
        {
            return Err(too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_transport_error(url, e))?
        {
            if bytes.len() + chunk.len() > MAX_CONTENT_BYTES {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!("Fetched {} bytes from {}", body.len(), url);

        Ok(FetchedContent {
            url: url.to_string(),
            body,
        })
    }
}
