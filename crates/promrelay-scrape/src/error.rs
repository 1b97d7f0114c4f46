//! Error types for the scraper.

use thiserror::Error;

use crate::text::TextParseError;

pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Errors surfaced by a single scrape attempt.
///
/// No retries happen at this layer; every variant is terminal for the
/// attempt and carries enough context to log it on its own.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// DNS resolution or TCP connect failure.
    #[error("request {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP transport failure: handshake, request send, or body read.
    #[error("request {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: hyper::Error,
    },

    /// The target URL could not be expressed as a request.
    #[error("cannot build request for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: http::Error,
    },

    /// The target answered with a non-200 status. The raw body is kept
    /// for diagnostics.
    #[error("request failed - {status}, response: {body:?}")]
    Status {
        status: http::StatusCode,
        body: String,
    },

    /// The response body does not conform to the text exposition format.
    #[error(transparent)]
    Text(#[from] TextParseError),
}
