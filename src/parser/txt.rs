//! Delimited-text parsing: one `name,…,url` entry per line.
//!
//! The first comma-separated field is the channel name and the last is the
//! URL; anything in between (group tags, resolution hints) is ignored. Lines
//! without the delimiter or with an unrecognized URL scheme are dropped and
//! counted.

use tracing::debug;

use super::ParseStats;
use crate::models::{CandidateUrl, ChannelSet};

pub fn parse(text: &str) -> (ChannelSet, ParseStats) {
    let mut set = ChannelSet::new();
    let mut stats = ParseStats::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !line.contains(',') {
            stats.skipped += 1;
            continue;
        }

        let mut fields = line.split(',');
        let name = fields.next().map(str::trim).unwrap_or("");
        let url = fields.last().map(str::trim).unwrap_or("");
        if name.is_empty() || url.is_empty() {
            stats.skipped += 1;
            continue;
        }

        match CandidateUrl::parse(url) {
            Some(candidate) => {
                set.insert_url(name, candidate);
                stats.entries += 1;
            }
            None => {
                debug!("skipping line with invalid url: {line}");
                stats.skipped += 1;
            }
        }
    }

    (set, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_field_is_name_last_is_url() {
        let (set, stats) = parse("CCTV1,高清,http://a/1\n湖南卫视,http://a/hunan\n");
        assert_eq!(set.urls("CCTV1").unwrap()[0].url, "http://a/1");
        assert_eq!(set.urls("湖南卫视").unwrap()[0].url, "http://a/hunan");
        assert_eq!(stats.entries, 2);
    }

    #[test]
    fn lines_without_delimiter_are_skipped() {
        let (set, stats) = parse("央视频道\nCCTV1,http://a/1\n");
        assert_eq!(set.channel_count(), 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn unrecognized_scheme_is_skipped() {
        let (set, stats) = parse("CCTV1,mms://a/1\nCCTV1,file:///x\n");
        assert!(set.is_empty());
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let (set, stats) = parse("\n\nCCTV1,http://a/1\n\n");
        assert_eq!(set.url_count(), 1);
        assert_eq!(stats.skipped, 0);
    }
}
