//! Remote subscription fetching with bounded retry.
//!
//! All sources are fetched concurrently; each source retries independently
//! with a linearly growing delay and, once its attempts are exhausted, is
//! skipped for the run instead of failing the batch.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use tracing::{info, warn};

use super::{Contribution, SourceProvider};
use crate::config::FetchConfig;
use crate::errors::{AppError, FetchError};
use crate::merge::merge;
use crate::parser::SourceParser;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub(crate) fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers
}

/// Outcome of fetching one source URL.
#[derive(Debug)]
pub struct SourceFetch {
    pub url: String,
    pub body: Result<String, FetchError>,
}

pub struct SourceFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl SourceFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch every source concurrently; one slow or failing source never
    /// blocks the others.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<SourceFetch> {
        let fetches = urls.iter().map(|url| async move {
            SourceFetch {
                url: url.clone(),
                body: self.fetch_with_retry(url).await,
            }
        });
        join_all(fetches).await
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut last_error = FetchError::Transport("no attempt made".to_string());

        for attempt in 1..=self.config.retry_times.max(1) {
            let error = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.text().await {
                        Ok(body) => return Ok(body),
                        Err(err) => FetchError::from_reqwest(&err),
                    }
                }
                Ok(response) => FetchError::Status(response.status().as_u16()),
                Err(err) => FetchError::from_reqwest(&err),
            };
            warn!("fetch attempt {attempt} for {url} failed: {error}");

            if !error.is_retryable() {
                return Err(error);
            }
            last_error = error;
            if attempt < self.config.retry_times {
                tokio::time::sleep(self.config.retry_delay(attempt)).await;
            }
        }

        Err(FetchError::Exhausted {
            attempts: self.config.retry_times,
            last: last_error.to_string(),
        })
    }
}

/// Provider over the configured remote subscription list.
pub struct SubscribeSource {
    fetcher: SourceFetcher,
    parser: SourceParser,
    urls: Vec<String>,
}

impl SubscribeSource {
    pub fn new(urls: Vec<String>, config: FetchConfig) -> Result<Self, AppError> {
        Ok(Self {
            fetcher: SourceFetcher::new(config)?,
            parser: SourceParser::new()?,
            urls,
        })
    }
}

#[async_trait]
impl SourceProvider for SubscribeSource {
    fn name(&self) -> &'static str {
        "subscribe"
    }

    async fn collect(&self) -> Contribution {
        let mut contribution = Contribution {
            sources_total: self.urls.len(),
            ..Contribution::default()
        };

        let mut sets = Vec::new();
        for fetch in self.fetcher.fetch_all(&self.urls).await {
            match fetch.body {
                Ok(body) => {
                    let (set, stats) = self.parser.parse(&body);
                    info!(
                        source = %fetch.url,
                        channels = set.channel_count(),
                        entries = stats.entries,
                        skipped = stats.skipped,
                        "parsed subscription source"
                    );
                    contribution.sources_fetched += 1;
                    sets.push(set);
                }
                Err(error) => {
                    warn!("skipping source {}: {error}", fetch.url);
                    contribution.sources_failed += 1;
                }
            }
        }

        contribution.set = merge(sets);
        contribution
    }
}
