//! Pipeline orchestration: the batch transform invoked by an external
//! scheduler or the CLI.
//!
//! Every stage consumes the previous stage's output read-only; the run
//! always produces a best-effort ranked set, even when every source failed,
//! and returns its statistics instead of mutating shared state.

use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::merge::merge;
use crate::models::{PipelineStats, RankedChannelSet};
use crate::probe::ProbeEngine;
use crate::ranking::filter_and_rank;
use crate::sources::{
    HotelSource, LocalFileSource, MulticastSource, SourceProvider, SubscribeSource,
};

/// A completed run: the terminal ranked artifact plus its statistics.
#[derive(Debug)]
pub struct PipelineReport {
    pub ranked: RankedChannelSet,
    pub stats: PipelineStats,
}

pub async fn run_pipeline(config: &Config) -> Result<PipelineReport, AppError> {
    let mut stats = PipelineStats::begin();

    let mut providers: Vec<Box<dyn SourceProvider>> = Vec::new();
    if config.toggles.subscribe_sources {
        providers.push(Box::new(SubscribeSource::new(
            config.sources.clone(),
            config.fetch.clone(),
        )?));
    }
    if config.toggles.hotel_sources {
        providers.push(Box::new(HotelSource));
    }
    if config.toggles.multicast_sources {
        providers.push(Box::new(MulticastSource));
    }
    if config.toggles.local_source {
        providers.push(Box::new(LocalFileSource::new(config.local_file.clone())));
    }

    let mut sets = Vec::new();
    for provider in &providers {
        info!("collecting '{}' sources", provider.name());
        let contribution = provider.collect().await;
        stats.sources_total += contribution.sources_total;
        stats.sources_fetched += contribution.sources_fetched;
        stats.sources_failed += contribution.sources_failed;
        if contribution.set.is_empty() {
            warn!("'{}' sources contributed no channels", provider.name());
        }
        sets.push(contribution.set);
    }

    let merged = merge(sets);
    stats.channels_merged = merged.channel_count();
    if merged.is_empty() {
        warn!("no channels collected from any source, producing empty result");
    }

    let engine = ProbeEngine::new(config.probe.clone(), config.filter.clone())?;
    let results = engine.probe_all(&merged).await;
    for channel_results in results.values() {
        for result in channel_results {
            stats.urls_probed += 1;
            if result.valid {
                stats.urls_valid += 1;
            } else {
                stats.urls_failed += 1;
            }
        }
    }
    info!(
        probed = stats.urls_probed,
        valid = stats.urls_valid,
        failed = stats.urls_failed,
        "probe run completed"
    );

    let ranked = filter_and_rank(
        &merged,
        &results,
        &config.filter,
        config.probe.max_urls_per_channel,
    );
    stats.channels_ranked = ranked.channel_count();
    stats.urls_ranked = ranked.url_count();
    stats.finish();

    Ok(PipelineReport { ranked, stats })
}
