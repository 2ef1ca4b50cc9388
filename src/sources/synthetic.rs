//! Synthetic source generators.
//!
//! Hotel-network gateways and raw multicast groups carry channels that
//! public playlists rarely list. Both generators expand small static address
//! tables into candidate URLs with no network access; their output is
//! deterministic across runs.

use async_trait::async_trait;
use tracing::debug;

use super::{Contribution, SourceProvider};
use crate::models::{CandidateUrl, ChannelSet};

/// Hotel IPTV gateways that relay multicast groups over HTTP.
const HOTEL_GATEWAYS: &[(&str, u16)] = &[("10.0.0.1", 4022), ("172.16.0.1", 8088), ("192.168.1.1", 8000)];

/// Channel → multicast group octets behind a hotel gateway.
const HOTEL_CHANNELS: &[(&str, (u8, u8, u8), u16)] = &[
    ("CCTV-1 综合", (1, 1, 1), 5140),
    ("CCTV-2 财经", (1, 1, 2), 5140),
    ("湖南卫视", (1, 2, 1), 5140),
    ("浙江卫视", (1, 2, 2), 5140),
    ("东方卫视", (1, 2, 3), 5140),
];

/// Channel → raw multicast groups.
const MULTICAST_CHANNELS: &[(&str, &[(&str, u16)])] = &[
    ("CCTV-1 综合", &[("239.1.1.1", 5140), ("239.1.1.2", 5140), ("239.1.1.3", 5140)]),
    ("CCTV-2 财经", &[("239.1.1.4", 5140), ("239.1.1.5", 5140)]),
    ("CCTV-3 综艺", &[("239.1.1.6", 5140), ("239.1.1.7", 5140)]),
    ("湖南卫视", &[("239.1.2.1", 5140), ("239.1.2.2", 5140)]),
    ("浙江卫视", &[("239.1.2.3", 5140), ("239.1.2.4", 5140)]),
    ("东方卫视", &[("239.1.2.5", 5140), ("239.1.2.6", 5140)]),
];

pub fn hotel_sources() -> ChannelSet {
    let mut set = ChannelSet::new();
    for (channel, (a, b, c), group_port) in HOTEL_CHANNELS {
        for (gateway, gateway_port) in HOTEL_GATEWAYS {
            let url = format!("http://{gateway}:{gateway_port}/udp/239.{a}.{b}.{c}:{group_port}");
            if let Some(candidate) = CandidateUrl::parse(&url) {
                set.insert_url(channel, candidate);
            }
        }
    }
    debug!(channels = set.channel_count(), urls = set.url_count(), "generated hotel sources");
    set
}

pub fn multicast_sources() -> ChannelSet {
    let mut set = ChannelSet::new();
    for (channel, groups) in MULTICAST_CHANNELS {
        for (group, port) in *groups {
            let url = format!("udp://@{group}:{port}");
            if let Some(candidate) = CandidateUrl::parse(&url) {
                set.insert_url(channel, candidate);
            }
        }
    }
    debug!(channels = set.channel_count(), urls = set.url_count(), "generated multicast sources");
    set
}

pub struct HotelSource;

#[async_trait]
impl SourceProvider for HotelSource {
    fn name(&self) -> &'static str {
        "hotel"
    }

    async fn collect(&self) -> Contribution {
        Contribution::local(hotel_sources())
    }
}

pub struct MulticastSource;

#[async_trait]
impl SourceProvider for MulticastSource {
    fn name(&self) -> &'static str {
        "multicast"
    }

    async fn collect(&self) -> Contribution {
        Contribution::local(multicast_sources())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Protocol;

    #[test]
    fn hotel_sources_are_deterministic_and_valid() {
        let first = hotel_sources();
        let second = hotel_sources();
        assert_eq!(first.channel_count(), second.channel_count());
        assert_eq!(first.url_count(), second.url_count());
        assert_eq!(first.url_count(), HOTEL_CHANNELS.len() * HOTEL_GATEWAYS.len());

        for (_, urls) in first.iter() {
            for candidate in urls {
                assert_eq!(candidate.protocol, Protocol::Http);
            }
        }
        assert_eq!(
            first.urls("CCTV-1 综合").unwrap()[0].url,
            "http://10.0.0.1:4022/udp/239.1.1.1:5140"
        );
    }

    #[test]
    fn multicast_sources_use_udp_scheme() {
        let set = multicast_sources();
        assert_eq!(set.channel_count(), MULTICAST_CHANNELS.len());
        for (_, urls) in set.iter() {
            for candidate in urls {
                assert_eq!(candidate.protocol, Protocol::Udp);
            }
        }
        assert_eq!(set.urls("湖南卫视").unwrap()[0].url, "udp://@239.1.2.1:5140");
    }
}
