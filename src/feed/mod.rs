//! Feed retrieval and parsing.
//!
//! - [`fetcher`] - HTTP download of the feed document
//! - [`parser`] - RSS 2.0 channel/item extraction using `quick-xml`
//! - [`date`] - `pubDate` normalization to `yyyy/MM/dd`
//!
//! # Example
//!
//! ```ignore
//! use rss_export::feed::{fetch_feed, parse_feed, normalize_pub_date};
//!
//! let bytes = fetch_feed(&client, "https://example.com/feed.xml").await?;
//! let feed = parse_feed(&bytes)?;
//! let date = normalize_pub_date(&feed.items[0].pub_date);
//! ```

mod date;
mod fetcher;
mod parser;

pub use date::normalize_pub_date;
pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed, Channel, Feed, FeedError, Item};
