//! Live-stream source aggregation and validation pipeline.
//!
//! The crate collects candidate stream URLs from remote playlists, synthetic
//! generators and a local override file, merges and deduplicates them, probes
//! every candidate under bounded concurrency, and ranks the survivors into a
//! template-organized channel list with three output renderings (txt, m3u,
//! json snapshot).

pub mod aliases;
pub mod config;
pub mod errors;
pub mod merge;
pub mod models;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod probe;
pub mod ranking;
pub mod sources;
pub mod template;

pub use config::Config;
pub use errors::AppError;
pub use pipeline::{run_pipeline, PipelineReport};
