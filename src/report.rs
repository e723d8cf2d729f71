//! Human-readable dump of a parsed feed, printed before the export runs.
use std::io::{self, Write};

use crate::feed::Feed;

const BANNER: &str = "====";

/// Writes the channel block followed by one block per item.
pub fn print_feed<W: Write>(out: &mut W, feed: &Feed) -> io::Result<()> {
    let channel = &feed.channel;
    writeln!(out, "{BANNER}")?;
    writeln!(out, "RSS Channel Info")?;
    writeln!(out, "{BANNER}")?;
    writeln!(out, "Title         : {}", channel.title)?;
    writeln!(out, "Description   : {}", channel.description)?;
    writeln!(out, "Link          : {}", channel.link)?;
    writeln!(out, "LastBuildDate : {}", channel.last_build_date)?;
    writeln!(out)?;

    writeln!(out, "{BANNER}")?;
    writeln!(out, "RSS Items")?;
    writeln!(out, "{BANNER}")?;
    for item in &feed.items {
        writeln!(out, "Title         : {}", item.title)?;
        writeln!(out, "Description   : {}", item.description)?;
        writeln!(out, "PubDate       : {}", item.pub_date)?;
        writeln!(out, "Link          : {}", item.link)?;
        writeln!(out)?;
    }
    Ok(())
}
