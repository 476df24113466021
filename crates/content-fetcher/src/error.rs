//! Content fetcher errors

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when fetching site content
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed or uses an unsupported scheme
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// URL as given in the DummySite
        url: String,
        /// Parser or scheme complaint
        reason: String,
    },

    /// The remote server did not answer in time
    #[error("Request to {url} timed out after {}ms", .after.as_millis())]
    Timeout {
        /// Requested URL
        url: String,
        /// Configured request timeout
        after: Duration,
    },

    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote server answered with a non-2xx status
    #[error("Failed to fetch URL: {code} {reason}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Canonical reason phrase
        reason: String,
    },

    /// The body does not fit in a ConfigMap
    #[error("Content from {url} exceeds the {limit} byte limit")]
    TooLarge {
        /// Requested URL
        url: String,
        /// Largest accepted body in bytes
        limit: usize,
    },
}

impl FetchError {
    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Http(_) => true,
            FetchError::Status { code, .. } => *code >= 500 || *code == 429,
            FetchError::InvalidUrl { .. } | FetchError::TooLarge { .. } => false,
        }
    }
}
