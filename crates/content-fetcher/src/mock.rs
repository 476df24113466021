//! Mock ContentFetcher for unit testing
//!
//! Serves canned bodies from memory and records every requested URL so tests
//! can assert on fetch behaviour without network access.

use crate::client::FetchedContent;
use crate::error::FetchError;
use crate::fetcher_trait::ContentFetcherTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Failure a mock URL should produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Behave like a request that exceeded its timeout
    Timeout,
    /// Answer with a non-2xx status
    Status(u16),
}

#[derive(Debug, Clone)]
enum MockResponse {
    Body(String),
    Failure(MockFailure),
}

/// Mock ContentFetcher for testing
///
/// Unknown URLs answer `404 Not Found`.
#[derive(Debug, Clone, Default)]
pub struct MockContentFetcher {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockContentFetcher {
    /// Create a new mock fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url` (for test setup)
    pub fn set_body(&self, url: impl Into<String>, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), MockResponse::Body(body.into()));
    }

    /// Make requests for `url` fail (for test setup)
    pub fn set_failure(&self, url: impl Into<String>, failure: MockFailure) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), MockResponse::Failure(failure));
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ContentFetcherTrait for MockContentFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Body(body)) => Ok(FetchedContent {
                url: url.to_string(),
                body,
            }),
            Some(MockResponse::Failure(MockFailure::Timeout)) => Err(FetchError::Timeout {
                url: url.to_string(),
                after: Duration::from_secs(10),
            }),
            Some(MockResponse::Failure(MockFailure::Status(code))) => Err(FetchError::Status {
                code,
                reason: "Mock failure".to_string(),
            }),
            None => Err(FetchError::Status {
                code: 404,
                reason: "Not Found".to_string(),
            }),
        }
    }
}
