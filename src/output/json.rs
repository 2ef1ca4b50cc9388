//! Structured machine-readable snapshot of a ranked channel set.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::m3u::categorize;
use crate::models::RankedChannelSet;

#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub total_channels: usize,
    pub total_urls: usize,
    pub channels: BTreeMap<String, ChannelEntry>,
}

#[derive(Debug, Serialize)]
pub struct ChannelEntry {
    pub urls: Vec<String>,
    pub url_count: usize,
    pub category: &'static str,
}

pub fn snapshot(ranked: &RankedChannelSet, generated_at: DateTime<Utc>) -> Snapshot {
    let channels = ranked
        .iter()
        .map(|(name, urls)| {
            (
                name.to_string(),
                ChannelEntry {
                    urls: urls.to_vec(),
                    url_count: urls.len(),
                    category: categorize(name),
                },
            )
        })
        .collect();

    Snapshot {
        version: "1.0",
        generated_at,
        total_channels: ranked.channel_count(),
        total_urls: ranked.url_count(),
        channels,
    }
}

pub fn render(
    ranked: &RankedChannelSet,
    generated_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&snapshot(ranked, generated_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_counts_include_empty_channels() {
        let mut ranked = RankedChannelSet::new();
        ranked.insert("CCTV1", vec!["http://a/1".to_string(), "http://a/2".to_string()]);
        ranked.insert("dead", vec![]);

        let snap = snapshot(&ranked, Utc::now());
        assert_eq!(snap.total_channels, 2);
        assert_eq!(snap.total_urls, 2);
        assert_eq!(snap.channels["CCTV1"].url_count, 2);
        assert_eq!(snap.channels["dead"].url_count, 0);
        assert_eq!(snap.channels["CCTV1"].category, "央视频道");
    }

    #[test]
    fn rendering_is_valid_json() {
        let mut ranked = RankedChannelSet::new();
        ranked.insert("湖南卫视", vec!["http://a/hn".to_string()]);
        let rendered = render(&ranked, Utc::now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["channels"]["湖南卫视"]["url_count"], 1);
    }
}
