//! M3U playlist parsing.
//!
//! Entries are an `#EXTINF:` metadata line paired with the very next
//! non-comment, non-blank line, which becomes the entry's URL. The display
//! name comes from the `tvg-name` attribute when present, otherwise from the
//! free text after the last comma. Icon and group attributes are parsed and
//! kept on the entry for forward compatibility even though nothing downstream
//! consumes them yet.

use regex::Regex;
use tracing::debug;

use super::ParseStats;
use crate::models::{CandidateUrl, ChannelSet};

/// Metadata extracted from one `#EXTINF:` line.
#[derive(Debug, Clone)]
struct ExtInf {
    name: String,
    logo: Option<String>,
    group: Option<String>,
}

pub struct M3uParser {
    name_re: Regex,
    logo_re: Regex,
    group_re: Regex,
}

impl M3uParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            name_re: Regex::new(r#"tvg-name="([^"]*)""#)?,
            logo_re: Regex::new(r#"tvg-logo="([^"]*)""#)?,
            group_re: Regex::new(r#"group-title="([^"]*)""#)?,
        })
    }

    pub fn parse(&self, text: &str) -> (ChannelSet, ParseStats) {
        let mut set = ChannelSet::new();
        let mut stats = ParseStats::default();
        let mut pending: Option<ExtInf> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("#EXTINF:") {
                pending = self.parse_extinf(line);
                if pending.is_none() {
                    stats.skipped += 1;
                }
            } else if line.starts_with('#') {
                // other directives and comments do not break the pairing
                continue;
            } else if let Some(entry) = pending.take() {
                match CandidateUrl::parse(line) {
                    Some(candidate) => {
                        debug!(
                            channel = %entry.name,
                            logo = entry.logo.as_deref().unwrap_or(""),
                            group = entry.group.as_deref().unwrap_or(""),
                            "parsed m3u entry"
                        );
                        set.insert_url(&entry.name, candidate);
                        stats.entries += 1;
                    }
                    None => {
                        debug!("skipping invalid url line: {line}");
                        stats.skipped += 1;
                    }
                }
            } else {
                // URL line with no preceding metadata: malformed stream
                stats.skipped += 1;
            }
        }

        (set, stats)
    }

    fn parse_extinf(&self, line: &str) -> Option<ExtInf> {
        let name = match self.name_re.captures(line).and_then(|c| c.get(1)) {
            Some(m) if !m.as_str().trim().is_empty() => m.as_str().trim().to_string(),
            _ => {
                let trailing = line.rfind(',').map(|pos| line[pos + 1..].trim())?;
                if trailing.is_empty() {
                    return None;
                }
                trailing.to_string()
            }
        };

        let logo = self
            .logo_re
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
        let group = self
            .group_re
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());

        Some(ExtInf { name, logo, group })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> (ChannelSet, ParseStats) {
        M3uParser::new().unwrap().parse(text)
    }

    #[test]
    fn name_comes_from_tvg_name_attribute() {
        let (set, stats) = parse(
            "#EXTM3U\n\
             #EXTINF:-1 tvg-name=\"CCTV-1 综合\" tvg-logo=\"http://logo/1.png\" group-title=\"央视\",CCTV1\n\
             http://a/1\n",
        );
        assert!(set.urls("CCTV-1 综合").is_some());
        assert!(set.urls("CCTV1").is_none());
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn name_falls_back_to_trailing_text() {
        let (set, _) = parse("#EXTM3U\n#EXTINF:-1,湖南卫视\nhttp://a/hunan\n");
        assert_eq!(set.urls("湖南卫视").unwrap()[0].url, "http://a/hunan");
    }

    #[test]
    fn comments_and_blanks_do_not_break_pairing() {
        let (set, _) = parse(
            "#EXTM3U\n#EXTINF:-1,CCTV1\n\n# a stray comment\nhttp://a/1\n",
        );
        assert_eq!(set.urls("CCTV1").unwrap()[0].url, "http://a/1");
    }

    #[test]
    fn url_without_metadata_is_skipped() {
        let (set, stats) = parse("#EXTM3U\nhttp://orphan/1\n#EXTINF:-1,CCTV1\nhttp://a/1\n");
        assert!(set.urls("CCTV1").is_some());
        assert_eq!(set.channel_count(), 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn invalid_url_is_dropped_and_counted() {
        let (set, stats) = parse("#EXTM3U\n#EXTINF:-1,CCTV1\nnot-a-url\n");
        assert!(set.urls("CCTV1").is_none());
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn duplicate_urls_survive_parsing_until_merge() {
        // dedup is the merge stage's job, the parser only collects
        let (set, _) = parse(
            "#EXTM3U\n#EXTINF:-1 tvg-name=\"CCTV-1 综合\",CCTV1\nhttp://a/1\n\
             #EXTINF:-1 tvg-name=\"CCTV-1 综合\",CCTV1\nhttp://a/1\n",
        );
        assert_eq!(set.urls("CCTV-1 综合").unwrap().len(), 2);
    }

    #[test]
    fn arbitrary_garbage_never_panics() {
        let (_, stats) = parse("#EXTINF:\n,,,,\n####\n\u{0000}binary\n");
        assert!(stats.entries == 0);
    }
}
