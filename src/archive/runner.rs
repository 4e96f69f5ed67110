//! Per-feed and per-item orchestration.
//!
//! Feeds are handled one at a time in the order given and items one at a
//! time in document order. Every failure is contained to the item (or feed)
//! it happened in; nothing aborts the run.

use std::path::{Path, PathBuf};

use super::decision::{decide, Decision};
use super::error::{FeedError, ItemError};
use super::paths::{enclosure_file_name, ensure_dir, plan_feed_dir, plan_item_dir};
use super::transfer::{transfer, IntegrityWarning, TransferReport};
use crate::feed::{fetch_feed, Item};
use crate::util::validate_url;

/// Where feed directories are created.
#[derive(Debug, Clone, Default)]
pub enum BaseDir {
    /// The process working directory, looked up once per feed.
    #[default]
    CurrentDir,
    /// A fixed directory.
    Path(PathBuf),
}

impl BaseDir {
    fn resolve(&self) -> std::io::Result<PathBuf> {
        match self {
            BaseDir::CurrentDir => std::env::current_dir(),
            BaseDir::Path(path) => Ok(path.clone()),
        }
    }
}

/// Terminal state of a single item.
#[derive(Debug)]
pub enum ItemOutcome {
    /// The enclosure was downloaded (fresh or overwriting a stale copy).
    Downloaded { path: PathBuf, report: TransferReport },
    /// A file of the right size is already on disk.
    AlreadyComplete { path: PathBuf, size: u64 },
    /// The item has no enclosure; only its directory was created.
    NoEnclosure { dir: PathBuf },
    /// The item lists more than one enclosure and was left alone.
    MultipleEnclosures { count: usize },
    /// Processing stopped at an error.
    Failed(ItemError),
}

/// What happened to every item of one feed.
#[derive(Debug)]
pub struct FeedReport {
    pub title: String,
    pub feed_dir: PathBuf,
    /// `(guid, outcome)` in document order.
    pub items: Vec<(String, ItemOutcome)>,
}

/// Downloads enclosures of syndication feeds into a directory tree.
#[derive(Debug, Clone)]
pub struct Archiver {
    client: reqwest::Client,
    base_dir: BaseDir,
    max_bytes_per_second: u64,
}

impl Archiver {
    pub fn new(client: reqwest::Client, max_bytes_per_second: u64) -> Self {
        Self {
            client,
            base_dir: BaseDir::CurrentDir,
            max_bytes_per_second,
        }
    }

    /// Archives into `base_dir` instead of the working directory.
    pub fn with_base_dir(mut self, base_dir: BaseDir) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Processes every address in order. Failures are logged and skipped.
    pub async fn archive_all<I, S>(&self, addresses: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for address in addresses {
            let address = address.as_ref();
            if let Err(e) = self.archive_feed(address).await {
                tracing::error!(feed = %address, error = %e, "Abandoning feed");
            }
        }
    }

    /// Fetches one feed and processes each of its items.
    pub async fn archive_feed(&self, address: &str) -> Result<FeedReport, FeedError> {
        let feed = fetch_feed(&self.client, address).await?;
        tracing::info!(
            title = %feed.title,
            feed = %address,
            items = feed.items.len(),
            "Processing feed"
        );

        let base = self.base_dir.resolve().map_err(FeedError::BaseDir)?;
        let feed_dir = plan_feed_dir(&base, &feed.title)?;
        ensure_dir(&feed_dir).await?;

        let mut items = Vec::with_capacity(feed.items.len());
        for item in &feed.items {
            let outcome = self.archive_item(&feed_dir, item).await;
            if let ItemOutcome::Failed(e) = &outcome {
                tracing::error!(
                    feed = %feed.title,
                    item = %item.title,
                    guid = %item.guid,
                    error = %e,
                    "Abandoning item"
                );
            }
            items.push((item.guid.clone(), outcome));
        }

        Ok(FeedReport {
            title: feed.title,
            feed_dir,
            items,
        })
    }

    /// Runs one item through the download state machine.
    pub async fn archive_item(&self, feed_dir: &Path, item: &Item) -> ItemOutcome {
        if item.enclosures.len() > 1 {
            tracing::warn!(
                item = %item.title,
                guid = %item.guid,
                count = item.enclosures.len(),
                "Item has more than one enclosure, skipping"
            );
            return ItemOutcome::MultipleEnclosures {
                count: item.enclosures.len(),
            };
        }

        match self.archive_enclosure(feed_dir, item).await {
            Ok(outcome) => outcome,
            Err(e) => ItemOutcome::Failed(e),
        }
    }

    async fn archive_enclosure(
        &self,
        feed_dir: &Path,
        item: &Item,
    ) -> Result<ItemOutcome, ItemError> {
        let item_dir = plan_item_dir(feed_dir, &item.guid);
        ensure_dir(&item_dir).await?;

        let Some(enclosure) = item.enclosures.first() else {
            tracing::debug!(guid = %item.guid, "Item has no enclosure");
            return Ok(ItemOutcome::NoEnclosure { dir: item_dir });
        };

        let url = validate_url(&enclosure.url)?;
        let path = item_dir.join(enclosure_file_name(&url)?);

        match decide(&self.client, &path, &url).await? {
            Decision::Complete { size } => {
                tracing::info!(url = %url, size = size, "Already downloaded, skipping");
                return Ok(ItemOutcome::AlreadyComplete { path, size });
            }
            Decision::Stale {
                local_size,
                remote_size,
            } => {
                tracing::warn!(
                    url = %url,
                    local_size = local_size,
                    remote_size = ?remote_size,
                    "Partially downloaded, overwriting"
                );
            }
            Decision::Absent => {}
        }

        tracing::info!(url = %url, path = %path.display(), "Downloading");
        let report = transfer(
            &self.client,
            &url,
            &path,
            enclosure.declared_length,
            self.max_bytes_per_second,
        )
        .await?;

        for warning in report.warnings() {
            match warning {
                IntegrityWarning::ServerLength { expected, actual } => tracing::warn!(
                    url = %url,
                    content_length = expected,
                    downloaded = actual,
                    "Download length differs from content length"
                ),
                IntegrityWarning::DeclaredLength { expected, actual } => tracing::warn!(
                    url = %url,
                    enclosure_length = expected,
                    downloaded = actual,
                    "Download length differs from enclosure length"
                ),
            }
        }

        tracing::info!(url = %url, bytes = report.bytes, "Download complete");
        Ok(ItemOutcome::Downloaded { path, report })
    }
}
