//! Local override file: the same delimited-text shape as remote txt sources,
//! maintained by hand next to the config. A missing file is an empty
//! contribution, not an error.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{Contribution, SourceProvider};
use crate::parser::txt;

pub struct LocalFileSource {
    path: Option<PathBuf>,
}

impl LocalFileSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SourceProvider for LocalFileSource {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn collect(&self) -> Contribution {
        let Some(path) = &self.path else {
            return Contribution::default();
        };

        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let (set, stats) = txt::parse(&contents);
                info!(
                    file = %path.display(),
                    channels = set.channel_count(),
                    entries = stats.entries,
                    skipped = stats.skipped,
                    "loaded local source file"
                );
                Contribution::local(set)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("local source file {} not found", path.display());
                Contribution::default()
            }
            Err(err) => {
                warn!("failed to read local source file {}: {err}", path.display());
                Contribution {
                    sources_total: 1,
                    sources_failed: 1,
                    ..Contribution::default()
                }
            }
        }
    }
}
