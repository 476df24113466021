//! ContentFetcher trait for mocking
//!
//! The concrete `ContentFetcher` implements this trait and tests can swap in
//! `MockContentFetcher` (feature `test-util`).

use crate::client::FetchedContent;
use crate::error::FetchError;

/// Trait for retrieving site content
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ContentFetcherTrait: Send + Sync {
    /// Fetch the document at `url`
    ///
    /// Timeouts, transport failures and non-2xx responses are errors.
    async fn fetch(&self, url: &str) -> Result<FetchedContent, FetchError>;
}
