//! Rate-limited streaming of an enclosure to disk.

use futures::{Stream, StreamExt};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

use super::decision::content_length;
use super::error::TransferError;
use super::limiter::RateLimiter;

/// Result of a completed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Bytes read from the response body and written to disk.
    pub bytes: u64,
    /// `Content-Length` sent with the body, if any.
    pub server_length: Option<u64>,
    /// Length the feed document claimed for the enclosure, if any.
    pub declared_length: Option<u64>,
}

/// A disagreement between the bytes received and a claimed length.
///
/// Claimed lengths are untrusted metadata; a mismatch is reported but the
/// file is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityWarning {
    ServerLength { expected: u64, actual: u64 },
    DeclaredLength { expected: u64, actual: u64 },
}

impl TransferReport {
    pub fn warnings(&self) -> Vec<IntegrityWarning> {
        let mut warnings = Vec::new();
        if let Some(expected) = self.server_length.filter(|&len| len != self.bytes) {
            warnings.push(IntegrityWarning::ServerLength {
                expected,
                actual: self.bytes,
            });
        }
        if let Some(expected) = self.declared_length.filter(|&len| len != self.bytes) {
            warnings.push(IntegrityWarning::DeclaredLength {
                expected,
                actual: self.bytes,
            });
        }
        warnings
    }
}

/// Downloads `url` into `path`, replacing whatever was there.
///
/// The response status is checked before the file is touched. Throughput is
/// capped at `max_bytes_per_second`. Any failure after the file was opened
/// removes it again.
pub async fn transfer(
    client: &reqwest::Client,
    url: &Url,
    path: &Path,
    declared_length: Option<u64>,
    max_bytes_per_second: u64,
) -> Result<TransferReport, TransferError> {
    let response = client.get(url.clone()).send().await?;

    if !response.status().is_success() {
        return Err(TransferError::HttpStatus(response.status().as_u16()));
    }

    let server_length = content_length(response.headers());
    let mut limiter = RateLimiter::new(max_bytes_per_second);

    tracing::debug!(
        url = %url,
        path = %path.display(),
        server_length = ?server_length,
        rate = limiter.rate(),
        "Starting download"
    );

    let bytes = write_stream(response.bytes_stream(), path, &mut limiter).await?;

    Ok(TransferReport {
        bytes,
        server_length,
        declared_length,
    })
}

/// Writes every chunk of `stream` to a freshly truncated file at `path`,
/// pacing writes through `limiter`.
///
/// Returns the number of bytes written. On error the file is deleted so a
/// later run sees nothing rather than a truncated copy.
pub async fn write_stream<S, B, E>(
    stream: S,
    path: &Path,
    limiter: &mut RateLimiter,
) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let result = copy_to_file(stream, path, limiter).await;

    if let Err(e) = &result {
        // The handle is already closed here; copy_to_file owns it
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), error = %e, "Removed partial download")
            }
            Err(rm) if rm.kind() == std::io::ErrorKind::NotFound => {}
            Err(rm) => tracing::warn!(
                path = %path.display(),
                error = %rm,
                "Failed to remove partial download"
            ),
        }
    }

    result
}

async fn copy_to_file<S, B, E>(
    stream: S,
    path: &Path,
    limiter: &mut RateLimiter,
) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let io_err = |source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o644);
    let mut file = options.open(path).await.map_err(io_err)?;

    let mut written: u64 = 0;
    let mut stream = std::pin::pin!(stream);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransferError::Stream {
            received: written,
            source: Box::new(e),
        })?;
        let chunk = chunk.as_ref();

        limiter.acquire(chunk.len() as u64).await;
        file.write_all(chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }

    // tokio buffers the last write in the background until flushed
    file.flush().await.map_err(io_err)?;

    Ok(written)
}
