//! Merge stage: union channel sets, preserving first-seen order, then remove
//! exact-duplicate URLs per channel. Merging is order-stable and idempotent.

use tracing::info;

use crate::models::ChannelSet;

pub fn merge(sets: Vec<ChannelSet>) -> ChannelSet {
    let mut merged = ChannelSet::new();
    for set in sets {
        merged.merge_from(set);
    }
    merged.dedup_urls();
    info!(
        channels = merged.channel_count(),
        urls = merged.url_count(),
        "merged channel sets"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateUrl;

    fn set_of(entries: &[(&str, &str)]) -> ChannelSet {
        let mut set = ChannelSet::new();
        for (channel, url) in entries {
            set.insert_url(channel, CandidateUrl::parse(url).unwrap());
        }
        set
    }

    fn flatten(set: &ChannelSet) -> Vec<(String, Vec<String>)> {
        set.iter()
            .map(|(name, urls)| {
                (
                    name.to_string(),
                    urls.iter().map(|c| c.url.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn merge_is_idempotent() {
        let a = set_of(&[
            ("CCTV1", "http://a/1"),
            ("CCTV1", "http://a/2"),
            ("湖南卫视", "http://b/1"),
        ]);
        let once = merge(vec![a.clone()]);
        let twice = merge(vec![a.clone(), a]);
        assert_eq!(flatten(&once), flatten(&twice));
    }

    #[test]
    fn no_url_appears_twice_per_channel() {
        let a = set_of(&[("ch", "http://a/1"), ("ch", "http://a/2")]);
        let b = set_of(&[("ch", "http://a/2"), ("ch", "http://a/3"), ("ch", "http://a/1")]);
        let merged = merge(vec![a, b]);
        let urls: Vec<String> = merged.urls("ch").unwrap().iter().map(|c| c.url.clone()).collect();
        assert_eq!(urls, vec!["http://a/1", "http://a/2", "http://a/3"]);
    }

    #[test]
    fn channel_order_follows_source_order() {
        let a = set_of(&[("x", "http://a/1")]);
        let b = set_of(&[("y", "http://b/1"), ("x", "http://b/2")]);
        let merged = merge(vec![a, b]);
        let order: Vec<&str> = merged.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["x", "y"]);
    }

    #[test]
    fn merging_nothing_yields_empty_set() {
        let merged = merge(Vec::new());
        assert!(merged.is_empty());
    }
}
