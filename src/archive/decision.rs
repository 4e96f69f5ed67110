//! Decides what to do about an enclosure before any body bytes move.

use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use std::path::Path;
use url::Url;

use super::error::{DecisionError, PathError, ProbeError};

/// Outcome of comparing the local file with the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing on disk yet; download it.
    Absent,
    /// Local size matches the remote length; leave it alone.
    Complete { size: u64 },
    /// Local size differs from the remote length (or the remote length is
    /// unknown); download again from scratch.
    Stale {
        local_size: u64,
        remote_size: Option<u64>,
    },
}

/// Inspects `path` and, if a file is already there, probes `url` with a
/// HEAD request to learn the remote length.
///
/// A failed probe is an error rather than a guess: the caller abandons the
/// item instead of blindly re-downloading or skipping it.
pub async fn decide(
    client: &reqwest::Client,
    path: &Path,
    url: &Url,
) -> Result<Decision, DecisionError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Decision::Absent),
        Err(source) => {
            return Err(PathError::Inspect {
                path: path.to_path_buf(),
                source,
            }
            .into())
        }
    };

    if !metadata.is_file() {
        return Err(PathError::NotAFile(path.to_path_buf()).into());
    }
    let local_size = metadata.len();

    let remote_size = probe_length(client, url).await?;
    tracing::debug!(
        url = %url,
        local_size = local_size,
        remote_size = ?remote_size,
        "Probed existing download"
    );

    Ok(match remote_size {
        Some(size) if size == local_size => Decision::Complete { size },
        remote_size => Decision::Stale {
            local_size,
            remote_size,
        },
    })
}

/// Sends a HEAD request and returns the advertised `Content-Length`.
pub async fn probe_length(client: &reqwest::Client, url: &Url) -> Result<Option<u64>, ProbeError> {
    let response = client.head(url.clone()).send().await?;

    if !response.status().is_success() {
        return Err(ProbeError::HttpStatus(response.status().as_u16()));
    }

    Ok(content_length(response.headers()))
}

/// Reads `Content-Length` straight from the headers.
///
/// `Response::content_length` reflects the body actually carried, which is
/// always empty for HEAD.
pub(crate) fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
