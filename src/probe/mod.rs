//! Concurrent candidate validation.
//!
//! Every (channel, url) pair surviving merge and the per-channel cap gets
//! exactly one probe task. Global concurrency is bounded by a semaphore
//! permit pool, and tasks are scheduled in fixed-size batches with a pause
//! between batches to avoid bursting the local network stack and remote
//! hosts. Probe failures are terminal observations about that URL and are
//! never retried; retry lives in the fetch stage only.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use futures::StreamExt;
use tokio::sync::Semaphore;
use tracing::{debug, info};
use url::Url;

use crate::config::{FilterConfig, ProbeConfig};
use crate::errors::AppError;
use crate::models::{ChannelSet, ProbeResult, Protocol};
use crate::sources::fetcher::default_headers;

/// Throughput is derived from a bounded body prefix, never the whole stream.
const SPEED_TEST_BYTE_CEILING: usize = 500 * 1024;

/// Fixed one-way probe datagram; no response is awaited.
const UDP_PROBE_PAYLOAD: [u8; 4] = [0, 0, 0, 0];

/// Nominal throughput reported for UDP targets that accepted the datagram.
const UDP_NOMINAL_THROUGHPUT: f64 = 1.0;

/// Nominal values for the unimplemented RTMP handshake.
const RTMP_NOMINAL_LATENCY: Duration = Duration::from_millis(200);
const RTMP_NOMINAL_THROUGHPUT: f64 = 0.8;

pub struct ProbeEngine {
    client: reqwest::Client,
    config: ProbeConfig,
    filter: FilterConfig,
}

impl ProbeEngine {
    pub fn new(config: ProbeConfig, filter: FilterConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .build()?;
        Ok(Self {
            client,
            config,
            filter,
        })
    }

    /// Probe every capped candidate of every channel, returning results
    /// grouped by channel. Completion order between probes is unspecified;
    /// the ranking stage restores a deterministic order.
    pub async fn probe_all(&self, channels: &ChannelSet) -> HashMap<String, Vec<ProbeResult>> {
        let candidates: Vec<(String, String)> = channels
            .iter()
            .flat_map(|(name, urls)| {
                urls.iter()
                    .take(self.config.max_urls_per_channel)
                    .map(move |candidate| (name.to_string(), candidate.url.clone()))
            })
            .collect();

        info!(
            channels = channels.channel_count(),
            candidates = candidates.len(),
            max_workers = self.config.max_workers,
            batch_size = self.config.batch_size,
            "starting probe run"
        );

        let tasks: Vec<_> = candidates
            .into_iter()
            .map(|(channel, url)| async move { self.probe_url(&channel, &url).await })
            .collect();

        let results = run_bounded(
            tasks,
            self.config.max_workers,
            self.config.batch_size,
            self.config.batch_pause(),
        )
        .await;

        let mut grouped: HashMap<String, Vec<ProbeResult>> = HashMap::new();
        for result in results {
            grouped.entry(result.channel.clone()).or_default().push(result);
        }
        grouped
    }

    /// Probe a single candidate URL, classifying its protocol first.
    pub async fn probe_url(&self, channel: &str, url: &str) -> ProbeResult {
        match Protocol::classify(url) {
            Some(protocol @ (Protocol::Http | Protocol::Https)) => {
                self.probe_http(channel, url, protocol).await
            }
            Some(Protocol::Udp) => self.probe_udp(channel, url).await,
            Some(Protocol::Rtmp) => self.rtmp_stub(channel, url),
            None => ProbeResult::invalid(channel, url, None, "unsupported protocol".to_string()),
        }
    }

    async fn probe_http(&self, channel: &str, url: &str, protocol: Protocol) -> ProbeResult {
        let timeout = self.config.timeout();
        let started = Instant::now();

        // HEAD is the preferred liveness check; a GET follows when the body
        // is needed for throughput or when HEAD is rejected.
        let head_ok = match self.client.head(url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        };

        if head_ok && !self.filter.open_speed_test {
            return self.valid_result(channel, url, protocol, started.elapsed(), 0.0);
        }

        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                return ProbeResult::invalid(channel, url, Some(protocol), http_error_string(&err))
            }
        };
        if !response.status().is_success() {
            return ProbeResult::invalid(
                channel,
                url,
                Some(protocol),
                format!("HTTP {}", response.status().as_u16()),
            );
        }
        let latency = started.elapsed();

        let throughput_mbps = if self.filter.open_speed_test {
            match tokio::time::timeout(timeout, read_body_prefix(response)).await {
                Ok(Ok((bytes, elapsed))) => {
                    bytes as f64 / elapsed.as_secs_f64().max(1e-6) / (1024.0 * 1024.0)
                }
                Ok(Err(err)) => {
                    return ProbeResult::invalid(
                        channel,
                        url,
                        Some(protocol),
                        http_error_string(&err),
                    )
                }
                Err(_) => {
                    return ProbeResult::invalid(channel, url, Some(protocol), "Timeout".to_string())
                }
            }
        } else {
            0.0
        };

        self.valid_result(channel, url, protocol, latency, throughput_mbps)
    }

    /// UDP liveness is operational: resolve the target and deliver one probe
    /// datagram without a socket error. The protocol is one-way best-effort,
    /// so no response is awaited.
    async fn probe_udp(&self, channel: &str, url: &str) -> ProbeResult {
        let started = Instant::now();
        let Some((host, port)) = parse_udp_target(url) else {
            return ProbeResult::invalid(
                channel,
                url,
                Some(Protocol::Udp),
                "missing host or port".to_string(),
            );
        };

        match tokio::time::timeout(self.config.timeout(), send_probe_datagram(&host, port)).await {
            Ok(Ok(())) => self.valid_result(
                channel,
                url,
                Protocol::Udp,
                started.elapsed(),
                UDP_NOMINAL_THROUGHPUT,
            ),
            Ok(Err(err)) => {
                ProbeResult::invalid(channel, url, Some(Protocol::Udp), err.to_string())
            }
            Err(_) => ProbeResult::invalid(channel, url, Some(Protocol::Udp), "Timeout".to_string()),
        }
    }

    /// No RTMP handshake is implemented; the URL is declared valid with
    /// nominal constants so RTMP sources keep flowing through the pipeline.
    fn rtmp_stub(&self, channel: &str, url: &str) -> ProbeResult {
        debug!("rtmp handshake not implemented, declaring {url} valid unprobed");
        self.valid_result(
            channel,
            url,
            Protocol::Rtmp,
            RTMP_NOMINAL_LATENCY,
            RTMP_NOMINAL_THROUGHPUT,
        )
    }

    fn valid_result(
        &self,
        channel: &str,
        url: &str,
        protocol: Protocol,
        latency: Duration,
        throughput_mbps: f64,
    ) -> ProbeResult {
        ProbeResult {
            url: url.to_string(),
            channel: channel.to_string(),
            protocol: Some(protocol),
            valid: true,
            latency: Some(latency),
            throughput_mbps,
            error: None,
            observed_at: Utc::now(),
        }
    }
}

fn http_error_string(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Timeout".to_string()
    } else {
        err.to_string()
    }
}

/// Read up to [`SPEED_TEST_BYTE_CEILING`] bytes of the response body,
/// returning the byte count and elapsed read time.
async fn read_body_prefix(response: reqwest::Response) -> Result<(usize, Duration), reqwest::Error> {
    let started = Instant::now();
    let mut stream = response.bytes_stream();
    let mut total = 0usize;
    while let Some(chunk) = stream.next().await {
        total += chunk?.len();
        if total >= SPEED_TEST_BYTE_CEILING {
            break;
        }
    }
    Ok((total, started.elapsed()))
}

fn parse_udp_target(url: &str) -> Option<(String, u16)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();
    let port = parsed.port()?;
    Some((host, port))
}

async fn send_probe_datagram(host: &str, port: u16) -> std::io::Result<()> {
    let mut addrs = tokio::net::lookup_host((host, port)).await?;
    let addr = addrs.next().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved")
    })?;
    let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = tokio::net::UdpSocket::bind(bind_addr).await?;
    socket.send_to(&UDP_PROBE_PAYLOAD, addr).await?;
    Ok(())
}

/// Run futures with a bounded permit pool, in fixed-size batches with a
/// throttle pause between batches. Batch boundaries only shape scheduling;
/// per-batch result order is preserved, so the output order matches the
/// input order.
pub async fn run_bounded<F, T>(
    tasks: Vec<F>,
    max_workers: usize,
    batch_size: usize,
    batch_pause: Duration,
) -> Vec<T>
where
    F: Future<Output = T>,
{
    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let total = tasks.len();
    let mut results = Vec::with_capacity(total);
    let mut remaining = tasks.into_iter();
    let mut scheduled = 0usize;

    while scheduled < total {
        let batch: Vec<F> = remaining.by_ref().take(batch_size.max(1)).collect();
        if batch.is_empty() {
            break;
        }
        scheduled += batch.len();

        let guarded = batch.into_iter().map(|task| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.ok();
                task.await
            }
        });
        results.extend(join_all(guarded).await);

        if scheduled < total {
            tokio::time::sleep(batch_pause).await;
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterConfig, ProbeConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine() -> ProbeEngine {
        ProbeEngine::new(ProbeConfig::default(), FilterConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn unsupported_scheme_is_invalid() {
        let result = engine().probe_url("ch", "mms://host/stream").await;
        assert!(!result.valid);
        assert_eq!(result.protocol, None);
        assert_eq!(result.error.as_deref(), Some("unsupported protocol"));
    }

    #[tokio::test]
    async fn rtmp_is_declared_valid_with_nominal_constants() {
        let result = engine().probe_url("ch", "rtmp://host/live/stream").await;
        assert!(result.valid);
        assert_eq!(result.latency, Some(RTMP_NOMINAL_LATENCY));
        assert_eq!(result.throughput_mbps, RTMP_NOMINAL_THROUGHPUT);
    }

    #[tokio::test]
    async fn udp_send_to_loopback_is_valid() {
        // the discard port never answers, but a one-way send succeeds
        let result = engine().probe_url("ch", "udp://127.0.0.1:9").await;
        assert!(result.valid, "error: {:?}", result.error);
        assert_eq!(result.throughput_mbps, UDP_NOMINAL_THROUGHPUT);
        assert!(result.latency.is_some());
    }

    #[tokio::test]
    async fn udp_without_port_is_invalid() {
        let result = engine().probe_url("ch", "udp://@239.1.1.1").await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("missing host or port"));
    }

    #[tokio::test]
    async fn permit_pool_bounds_in_flight_tasks() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..40)
            .map(|_| {
                let in_flight = Arc::clone(&in_flight);
                let high_water = Arc::clone(&high_water);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();

        // one big batch so the semaphore is the only bound in play
        run_bounded(tasks, 4, 100, Duration::ZERO).await;
        assert!(high_water.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn batching_preserves_every_result_in_order() {
        let tasks: Vec<_> = (0..25).map(|i| async move { i }).collect();
        let results = run_bounded(tasks, 8, 10, Duration::ZERO).await;
        assert_eq!(results, (0..25).collect::<Vec<_>>());
    }
}
