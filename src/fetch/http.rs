use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::client::FeedFetcher;
use crate::error::FetchError;

/// [`FeedFetcher`] backed by a shared [`reqwest::Client`].
///
/// The timeout is mandatory and covers the whole request, connect included.
/// A fetch that exceeds it is abandoned; no partial body is returned. No
/// retries happen at this layer, the scheduler owns the retry cadence.
pub struct HttpFetcher(reqwest::Client);

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let resp = self.0.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = resp.bytes().await?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(body)
    }
}
