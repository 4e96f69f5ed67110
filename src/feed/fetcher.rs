use crate::feed::parser::{parse_feed, Feed};
use crate::util::{validate_url, UrlValidationError};
use futures::StreamExt;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 50 * 1024 * 1024; // 50MB

/// Errors that can occur while retrieving a feed document.
///
/// Any of these abandons the feed; the archiver moves on to the next address.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The feed address is not an http(s) URL
    #[error("Invalid feed address: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Document could not be parsed as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 50MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Fetches and parses the feed at `address`.
///
/// The whole document is buffered in memory (bounded by the size limit)
/// before parsing. There is no retry: a failed fetch is reported once.
///
/// # Errors
///
/// - [`FetchError::InvalidUrl`] - Address is not an http(s) URL
/// - [`FetchError::Network`] - Connection or TLS errors
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
/// - [`FetchError::ResponseTooLarge`] - Document exceeded 50MB
/// - [`FetchError::Parse`] - Invalid feed document
pub async fn fetch_feed(client: &reqwest::Client, address: &str) -> Result<Feed, FetchError> {
    let url = validate_url(address)?;

    tracing::debug!(feed = %url, "Fetching feed");
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    parse_feed(&bytes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
