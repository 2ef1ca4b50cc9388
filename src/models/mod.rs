//! Core data model shared by every pipeline stage.
//!
//! A `ChannelSet` is built fresh each run from the fetcher, the synthetic
//! generators and the local override file, mutated only by merge/dedup, then
//! handed read-only to the validator. `ProbeResult` values are created once
//! per probed candidate and only aggregated afterwards.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Transport protocols the validator knows how to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    Udp,
    Rtmp,
}

impl Protocol {
    /// Classify a raw URL by scheme. `None` means the scheme is not one the
    /// validator supports.
    pub fn classify(raw: &str) -> Option<Protocol> {
        match Url::parse(raw).ok()?.scheme() {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            "udp" => Some(Protocol::Udp),
            "rtmp" => Some(Protocol::Rtmp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Udp => "udp",
            Protocol::Rtmp => "rtmp",
        }
    }
}

/// One concrete endpoint claimed to serve a channel's stream.
///
/// Construction goes through [`CandidateUrl::parse`] so every instance is
/// guaranteed to carry a supported scheme and a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUrl {
    pub url: String,
    pub protocol: Protocol,
}

impl CandidateUrl {
    /// Parse and validate a raw URL string. Returns `None` for anything that
    /// is not a well-formed URL with a supported scheme and a host.
    pub fn parse(raw: &str) -> Option<CandidateUrl> {
        let raw = raw.trim();
        let parsed = Url::parse(raw).ok()?;
        let protocol = match parsed.scheme() {
            "http" => Protocol::Http,
            "https" => Protocol::Https,
            "udp" => Protocol::Udp,
            "rtmp" => Protocol::Rtmp,
            _ => return None,
        };
        parsed.host_str()?;
        Some(CandidateUrl {
            url: raw.to_string(),
            protocol,
        })
    }
}

/// Insertion-ordered mapping from channel name to its candidate URLs.
///
/// Channel order is first-seen order across merged sources; URL order within
/// a channel is discovery order. Channel names stay case-sensitive as
/// sourced.
#[derive(Debug, Clone, Default)]
pub struct ChannelSet {
    order: Vec<String>,
    channels: HashMap<String, Vec<CandidateUrl>>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a URL to a channel, creating the channel on first sight.
    pub fn insert_url(&mut self, channel: &str, url: CandidateUrl) {
        match self.channels.get_mut(channel) {
            Some(urls) => urls.push(url),
            None => {
                self.order.push(channel.to_string());
                self.channels.insert(channel.to_string(), vec![url]);
            }
        }
    }

    pub fn urls(&self, channel: &str) -> Option<&[CandidateUrl]> {
        self.channels.get(channel).map(|v| v.as_slice())
    }

    /// Iterate channels in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CandidateUrl])> {
        self.order
            .iter()
            .filter_map(|name| self.channels.get(name).map(|urls| (name.as_str(), urls.as_slice())))
    }

    /// Concatenate all channels of `other` onto this set, preserving the
    /// first-seen channel order.
    pub fn merge_from(&mut self, other: ChannelSet) {
        for name in other.order {
            if let Some(urls) = other.channels.get(&name) {
                for url in urls {
                    self.insert_url(&name, url.clone());
                }
            }
        }
    }

    /// Remove duplicate URLs within each channel, keeping the first
    /// occurrence.
    pub fn dedup_urls(&mut self) {
        for urls in self.channels.values_mut() {
            let mut seen = HashSet::new();
            urls.retain(|candidate| seen.insert(candidate.url.clone()));
        }
    }

    pub fn channel_count(&self) -> usize {
        self.order.len()
    }

    pub fn url_count(&self) -> usize {
        self.channels.values().map(|urls| urls.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Outcome of probing one candidate URL. Produced exactly once per
/// (channel, url) submitted to the validator, immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub url: String,
    pub channel: String,
    /// `None` when the scheme was unsupported.
    pub protocol: Option<Protocol>,
    pub valid: bool,
    /// `None` encodes "no response", which sorts after every finite latency.
    pub latency: Option<Duration>,
    pub throughput_mbps: f64,
    pub error: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl ProbeResult {
    pub fn invalid(channel: &str, url: &str, protocol: Option<Protocol>, error: String) -> Self {
        ProbeResult {
            url: url.to_string(),
            channel: channel.to_string(),
            protocol,
            valid: false,
            latency: None,
            throughput_mbps: 0.0,
            error: Some(error),
            observed_at: Utc::now(),
        }
    }

    /// Latency in seconds, with `None` mapped to infinity for ranking.
    pub fn latency_secs(&self) -> f64 {
        self.latency
            .map(|d| d.as_secs_f64())
            .unwrap_or(f64::INFINITY)
    }
}

/// The validator+filter pipeline's terminal artifact: ranked, truncated URL
/// lists per channel. Channels that lost every candidate keep an empty list
/// so the formatters can render an explicit "no source" marker.
#[derive(Debug, Clone, Default)]
pub struct RankedChannelSet {
    order: Vec<String>,
    channels: HashMap<String, Vec<String>>,
}

impl RankedChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel: &str, urls: Vec<String>) {
        if !self.channels.contains_key(channel) {
            self.order.push(channel.to_string());
        }
        self.channels.insert(channel.to_string(), urls);
    }

    pub fn urls(&self, channel: &str) -> Option<&[String]> {
        self.channels.get(channel).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.order
            .iter()
            .filter_map(|name| self.channels.get(name).map(|urls| (name.as_str(), urls.as_slice())))
    }

    pub fn channel_count(&self) -> usize {
        self.order.len()
    }

    pub fn url_count(&self) -> usize {
        self.channels.values().map(|urls| urls.len()).sum()
    }
}

/// Aggregate run statistics, returned by the pipeline rather than mutated in
/// place.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub sources_total: usize,
    pub sources_fetched: usize,
    pub sources_failed: usize,
    pub channels_merged: usize,
    pub urls_probed: usize,
    pub urls_valid: usize,
    pub urls_failed: usize,
    pub channels_ranked: usize,
    pub urls_ranked: usize,
}

impl PipelineStats {
    pub fn begin() -> Self {
        let now = Utc::now();
        PipelineStats {
            started_at: now,
            finished_at: now,
            elapsed_seconds: 0.0,
            sources_total: 0,
            sources_fetched: 0,
            sources_failed: 0,
            channels_merged: 0,
            urls_probed: 0,
            urls_valid: 0,
            urls_failed: 0,
            channels_ranked: 0,
            urls_ranked: 0,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
        self.elapsed_seconds = (self.finished_at - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
    }
}
