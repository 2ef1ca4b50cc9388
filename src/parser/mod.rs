//! Source format parsers.
//!
//! Two concrete input shapes are supported: m3u playlists and delimited
//! `name,url` text. The shape is autodetected on the `#EXTM3U` marker. Both
//! parsers are pure `(text) -> ChannelSet` transforms that drop and count
//! malformed lines instead of failing.

pub mod m3u;
pub mod txt;

use crate::models::ChannelSet;

pub use m3u::M3uParser;

/// Counters for one parsed source body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// (channel, url) entries accepted.
    pub entries: usize,
    /// Malformed or unrecognized lines dropped.
    pub skipped: usize,
}

/// Parser over both source shapes, holding the compiled m3u patterns.
pub struct SourceParser {
    m3u: M3uParser,
}

impl SourceParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            m3u: M3uParser::new()?,
        })
    }

    /// Parse a source body, autodetecting its format.
    pub fn parse(&self, text: &str) -> (ChannelSet, ParseStats) {
        if text.contains("#EXTM3U") {
            self.m3u.parse(text)
        } else {
            txt::parse(text)
        }
    }
}
