//! Enclosure archiving.
//!
//! Each item goes through the same steps:
//!
//! 1. [`paths`] - plan `<base>/<feed title>/<slug(guid)>/<file>` and create
//!    the directories
//! 2. [`decision`] - compare an existing file with the remote length
//!    (HEAD) to skip, overwrite or download
//! 3. [`transfer`] - stream the body to disk through the [`limiter`]
//!
//! [`runner::Archiver`] drives the steps for every feed and item.

pub mod decision;
pub mod error;
pub mod limiter;
pub mod paths;
pub mod runner;
pub mod transfer;

pub use decision::Decision;
pub use error::{DecisionError, FeedError, ItemError, PathError, ProbeError, TransferError};
pub use limiter::RateLimiter;
pub use runner::{Archiver, BaseDir, FeedReport, ItemOutcome};
pub use transfer::{IntegrityWarning, TransferReport};
