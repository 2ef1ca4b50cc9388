//! Run configuration.
//!
//! Loaded once per run from a TOML file and threaded explicitly through every
//! stage; no stage reads process-wide state. When the file is missing a
//! default configuration is written next to it so the first run documents
//! every recognized option.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote subscription source URLs (m3u or delimited text, autodetected).
    pub sources: Vec<String>,
    /// Local override file in delimited-text shape; optional.
    pub local_file: Option<PathBuf>,
    /// Category template file; built-in default template when absent.
    pub template_file: Option<PathBuf>,
    /// Alias table file; built-in default table when absent.
    pub alias_file: Option<PathBuf>,
    pub toggles: SourceToggles,
    pub fetch: FetchConfig,
    pub probe: ProbeConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
}

/// Feature switches for the individual source providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceToggles {
    pub subscribe_sources: bool,
    pub hotel_sources: bool,
    pub multicast_sources: bool,
    pub local_source: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per source before it is skipped for the run.
    pub retry_times: u32,
    /// Base delay between attempts; scaled by the attempt number.
    pub retry_delay_secs: u64,
    /// Total per-request deadline for source downloads.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Permit pool size: maximum simultaneously in-flight probes.
    pub max_workers: usize,
    /// Per-probe deadline.
    pub timeout_secs: u64,
    /// Probe tasks scheduled per batch.
    pub batch_size: usize,
    /// Throttle pause between batches.
    pub batch_pause_secs: u64,
    /// Candidate cap per channel, applied before probing and again when
    /// ranking.
    pub max_urls_per_channel: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Measure download throughput on HTTP probes and gate on `min_speed_mbps`.
    pub open_speed_test: bool,
    /// Minimum throughput in MB/s for a valid URL to survive ranking.
    pub min_speed_mbps: f64,
    /// Advisory IP version preference; recorded but not enforced.
    pub ipv_type: IpvType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpvType {
    All,
    Ipv4,
    Ipv6,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub txt_file: String,
    pub m3u_file: String,
    pub json_file: String,
    pub stats_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: vec![
                "https://raw.githubusercontent.com/iptv-org/iptv/master/streams/cn.m3u".to_string(),
                "https://raw.githubusercontent.com/fanmingming/live/main/tv/m3u/ipv6.m3u".to_string(),
                "https://raw.githubusercontent.com/yue365/IPTV/master/daily.m3u".to_string(),
                "https://raw.githubusercontent.com/kimwang1978/collect-tv-txt/main/merged_output.txt"
                    .to_string(),
                "https://raw.githubusercontent.com/suxuang/myIPTV/main/ipv6.m3u".to_string(),
                "https://raw.githubusercontent.com/vbskycn/iptv/master/tv/iptv4.txt".to_string(),
            ],
            local_file: Some(PathBuf::from("config/local.txt")),
            template_file: Some(PathBuf::from("config/template.txt")),
            alias_file: None,
            toggles: SourceToggles::default(),
            fetch: FetchConfig::default(),
            probe: ProbeConfig::default(),
            filter: FilterConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            subscribe_sources: true,
            hotel_sources: true,
            multicast_sources: true,
            local_source: true,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retry_times: 3,
            retry_delay_secs: 2,
            timeout_secs: 30,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_workers: 30,
            timeout_secs: 15,
            batch_size: 100,
            batch_pause_secs: 1,
            max_urls_per_channel: 10,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            open_speed_test: true,
            min_speed_mbps: 0.2,
            ipv_type: IpvType::All,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            txt_file: "result.txt".to_string(),
            m3u_file: "result.m3u".to_string(),
            json_file: "result.json".to_string(),
            stats_file: "stats.json".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before the next attempt; grows linearly with the attempt number.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.retry_delay_secs * u64::from(attempt))
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_secs(self.batch_pause_secs)
    }
}

impl Config {
    /// Load configuration from `path`, writing (and using) the defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, contents)?;
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_roundtrip_through_toml() {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.probe.max_workers, 30);
        assert_eq!(parsed.fetch.retry_times, 3);
        assert!(parsed.filter.open_speed_test);
        assert_eq!(parsed.filter.ipv_type, IpvType::All);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            sources = ["http://example.com/list.m3u"]

            [probe]
            max_workers = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.probe.max_workers, 5);
        // unspecified fields keep their defaults
        assert_eq!(config.probe.max_urls_per_channel, 10);
        assert_eq!(config.filter.min_speed_mbps, 0.2);
    }

    #[test]
    fn retry_delay_scales_with_attempt() {
        let fetch = FetchConfig::default();
        assert_eq!(fetch.retry_delay(1), Duration::from_secs(2));
        assert_eq!(fetch.retry_delay(2), Duration::from_secs(4));
    }
}
