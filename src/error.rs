//! Error taxonomy for the ingestion pipeline.
//!
//! Both variants are recovered locally by the scheduler: a failed cycle is
//! logged and the previous snapshot contribution for that source is kept.
//! Neither ever reaches a snapshot reader.

use thiserror::Error;

/// A feed document could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or transport failure, including a fetch exceeding its timeout.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-success status code.
    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The upstream answered 2xx but sent no body.
    #[error("upstream returned an empty body")]
    EmptyBody,
}

/// Raw bytes were retrieved but are not a valid feed document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed feed payload: {0}")]
    Protobuf(#[from] prost::DecodeError),
}
