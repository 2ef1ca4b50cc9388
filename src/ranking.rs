//! Filter & rank stage.
//!
//! Invalid results are discarded, the optional speed gate is applied,
//! survivors are sorted ascending by latency with throughput as the
//! tie-break, and the list is truncated. A channel that loses every
//! candidate keeps an empty list so the formatters can mark it instead of
//! dropping it.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::info;

use crate::config::FilterConfig;
use crate::models::{ChannelSet, ProbeResult, RankedChannelSet};

pub fn filter_and_rank(
    channels: &ChannelSet,
    results: &HashMap<String, Vec<ProbeResult>>,
    filter: &FilterConfig,
    max_urls_per_channel: usize,
) -> RankedChannelSet {
    let mut ranked = RankedChannelSet::new();

    for (channel, _) in channels.iter() {
        let mut survivors: Vec<&ProbeResult> = results
            .get(channel)
            .map(|channel_results| {
                channel_results
                    .iter()
                    .filter(|r| r.valid)
                    .filter(|r| !filter.open_speed_test || r.throughput_mbps >= filter.min_speed_mbps)
                    .collect()
            })
            .unwrap_or_default();

        survivors.sort_by(|a, b| {
            a.latency_secs()
                .partial_cmp(&b.latency_secs())
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.throughput_mbps
                        .partial_cmp(&a.throughput_mbps)
                        .unwrap_or(Ordering::Equal)
                })
        });

        let urls: Vec<String> = survivors
            .into_iter()
            .take(max_urls_per_channel)
            .map(|r| r.url.clone())
            .collect();
        ranked.insert(channel, urls);
    }

    info!(
        channels = ranked.channel_count(),
        urls = ranked.url_count(),
        "ranking completed"
    );
    ranked
}
