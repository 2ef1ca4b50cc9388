//! M3U playlist rendering, grouped by a keyword classifier that is
//! independent of the category template.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::RankedChannelSet;

const LOGO_URL_BASE: &str = "https://iptv-pro.github.io/cdn/logo";

/// Keyword → category table, checked in order; first hit wins.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("央视频道", &["cctv", "中央", "央视"]),
    ("卫视频道", &["卫视", "电视台"]),
    ("影视娱乐", &["影视", "电影", "剧场", "影院", "chc"]),
    ("新闻资讯", &["新闻", "资讯", "凤凰"]),
    ("体育频道", &["体育", "运动", "足球", "篮球"]),
    ("纪录频道", &["纪录", "发现", "探索", "地理", "历史"]),
    ("少儿频道", &["少儿", "卡通", "动漫", "动画", "卡酷"]),
    ("音乐艺术", &["音乐", "戏曲", "艺术"]),
];

const FALLBACK_CATEGORY: &str = "其他频道";

/// Heuristically classify a channel name by keyword.
pub fn categorize(channel_name: &str) -> &'static str {
    let name = channel_name.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|keyword| name.contains(keyword)) {
            return category;
        }
    }
    FALLBACK_CATEGORY
}

pub fn render(ranked: &RankedChannelSet, generated_at: DateTime<Utc>) -> String {
    let mut categories: BTreeMap<&'static str, Vec<(&str, &str)>> = BTreeMap::new();
    for (channel, urls) in ranked.iter() {
        if let Some(url) = urls.first() {
            categories
                .entry(categorize(channel))
                .or_default()
                .push((channel, url.as_str()));
        }
    }

    let mut out = Vec::new();
    out.push("#EXTM3U".to_string());
    out.push(format!(
        "# Generated at: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push(String::new());

    for (category, mut channels) in categories {
        channels.sort();
        for (channel, url) in channels {
            out.push(format!(
                "#EXTINF:-1 tvg-name=\"{channel}\" tvg-logo=\"{LOGO_URL_BASE}/{channel}.png\" \
                 group-title=\"{category}\",{channel}"
            ));
            out.push(url.to_string());
        }
        out.push(String::new());
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_classification() {
        assert_eq!(categorize("CCTV-5 体育"), "央视频道");
        assert_eq!(categorize("湖南卫视"), "卫视频道");
        assert_eq!(categorize("凤凰资讯"), "新闻资讯");
        assert_eq!(categorize("五星体育"), "体育频道");
        assert_eq!(categorize("金鹰卡通"), "少儿频道");
        assert_eq!(categorize("某地方台"), "其他频道");
    }

    #[test]
    fn renders_extinf_entry_with_group() {
        let mut ranked = RankedChannelSet::new();
        ranked.insert("湖南卫视", vec!["http://a/hn".to_string()]);
        let rendered = render(
            &ranked,
            DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        assert!(rendered.starts_with("#EXTM3U"));
        assert!(rendered.contains("tvg-name=\"湖南卫视\""));
        assert!(rendered.contains("group-title=\"卫视频道\""));
        assert!(rendered.contains("\nhttp://a/hn\n"));
    }

    #[test]
    fn channels_without_urls_are_not_rendered() {
        let mut ranked = RankedChannelSet::new();
        ranked.insert("dead", vec![]);
        let rendered = render(&ranked, Utc::now());
        assert!(!rendered.contains("dead"));
    }
}
