//! Site Content Fetcher
//!
//! Retrieves the page a `DummySite` points at so the controller can publish a
//! snapshot of it.
//!
//! # Example
//!
//! ```no_run
//! use content_fetcher::{ContentFetcher, ContentFetcherTrait};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = ContentFetcher::new(Duration::from_secs(10))?;
//! let page = fetcher.fetch("http://example.com").await?;
//! println!("fetched {} bytes", page.body.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod fetcher_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{ContentFetcher, FetchedContent, MAX_CONTENT_BYTES};
pub use error::FetchError;
pub use fetcher_trait::ContentFetcherTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockContentFetcher, MockFailure};
