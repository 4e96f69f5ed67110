//! Archive the media enclosures of podcast feeds to disk.
//!
//! Feeds are fetched one at a time; each item's single enclosure lands in
//! `<base>/<feed title>/<slug(guid)>/<file name>`, downloaded at a bounded
//! rate and skipped on later runs once complete.

pub mod archive;
pub mod config;
pub mod feed;
pub mod util;
