use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FetchError;

/// Abstraction over the retrieval of one feed document.
///
/// The seam sits at the byte level so tests can substitute canned payloads
/// or injected failures for the real HTTP client.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}
