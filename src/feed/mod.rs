//! Feed retrieval and parsing.
//!
//! - [`fetcher`] - HTTP retrieval of a feed document with a size cap
//! - [`parser`] - Reduction of RSS/Atom/JSON Feed documents (via `feed-rs`)
//!   into [`Feed`], [`Item`] and [`Enclosure`] values
//!
//! # Example
//!
//! ```ignore
//! use podvault::feed::fetch_feed;
//!
//! let feed = fetch_feed(&client, "https://example.com/podcast.xml").await?;
//! for item in &feed.items {
//!     println!("{} has {} enclosure(s)", item.guid, item.enclosures.len());
//! }
//! ```

mod fetcher;
mod parser;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed, Enclosure, Feed, Item};
