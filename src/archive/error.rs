use std::path::PathBuf;
use thiserror::Error;

use crate::feed::FetchError;
use crate::util::UrlValidationError;

/// Failure to set up the on-disk layout for a feed or an item.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Failed to create directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot derive a file or directory name from '{0}'")]
    InvalidName(String),

    #[error("'{}' exists but is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("Failed to inspect '{}': {source}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The metadata-only (HEAD) request for an existing download failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Probe request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Probe returned HTTP status {0}")]
    HttpStatus(u16),
}

/// The local file could not be inspected or the remote length probed.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Failure while streaming an enclosure to disk.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Download request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Download returned HTTP status {0}")]
    HttpStatus(u16),

    #[error("Download stream interrupted after {received} bytes: {source}")]
    Stream {
        received: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single item was abandoned.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Invalid enclosure URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl From<DecisionError> for ItemError {
    fn from(e: DecisionError) -> Self {
        match e {
            DecisionError::Path(e) => ItemError::Path(e),
            DecisionError::Probe(e) => ItemError::Probe(e),
        }
    }
}

/// Why a whole feed was abandoned.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to determine archive base directory: {0}")]
    BaseDir(#[source] std::io::Error),

    #[error(transparent)]
    Path(#[from] PathError),
}
