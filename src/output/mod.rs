//! Output renderings of a ranked channel set.
//!
//! All three renderings are pure projections of the same
//! `RankedChannelSet`; for one input they always resolve identically, the
//! only wall-clock content being the explicit generation timestamp passed
//! in. Writing them to disk is the one place where I/O errors are fatal.

pub mod json;
pub mod m3u;
pub mod txt;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::aliases::AliasTable;
use crate::config::OutputConfig;
use crate::errors::AppError;
use crate::models::{PipelineStats, RankedChannelSet};
use crate::template::Template;

pub use m3u::categorize;

/// Write the delimited listing, the m3u rendering, the structured snapshot
/// and the stats file into the output directory.
pub fn write_outputs(
    config: &OutputConfig,
    ranked: &RankedChannelSet,
    template: &Template,
    aliases: &AliasTable,
    stats: &PipelineStats,
    generated_at: DateTime<Utc>,
) -> Result<(), AppError> {
    std::fs::create_dir_all(&config.dir)?;

    let txt_path = config.dir.join(&config.txt_file);
    std::fs::write(&txt_path, txt::render(ranked, template, aliases, generated_at))?;

    let m3u_path = config.dir.join(&config.m3u_file);
    std::fs::write(&m3u_path, m3u::render(ranked, generated_at))?;

    let json_path = config.dir.join(&config.json_file);
    std::fs::write(&json_path, json::render(ranked, generated_at)?)?;

    let stats_path = config.dir.join(&config.stats_file);
    std::fs::write(&stats_path, serde_json::to_string_pretty(stats)?)?;

    info!(
        dir = %config.dir.display(),
        channels = ranked.channel_count(),
        urls = ranked.url_count(),
        "output files written"
    );
    Ok(())
}
