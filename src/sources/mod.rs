//! Source providers: everything that contributes candidate URLs to a run.
//!
//! Remote subscriptions, the two synthetic generators and the local override
//! file all implement [`SourceProvider`], so the orchestrator treats them
//! uniformly and a failing provider degrades to an empty contribution.

pub mod fetcher;
pub mod local;
pub mod synthetic;

use async_trait::async_trait;

use crate::models::ChannelSet;

pub use fetcher::{SourceFetcher, SubscribeSource};
pub use local::LocalFileSource;
pub use synthetic::{HotelSource, MulticastSource};

/// One provider's output for a run.
#[derive(Debug, Default)]
pub struct Contribution {
    pub set: ChannelSet,
    /// Upstream endpoints this provider consulted.
    pub sources_total: usize,
    pub sources_fetched: usize,
    pub sources_failed: usize,
}

impl Contribution {
    /// A contribution from a deterministic, always-available source.
    pub fn local(set: ChannelSet) -> Self {
        Contribution {
            set,
            sources_total: 1,
            sources_fetched: 1,
            sources_failed: 0,
        }
    }
}

#[async_trait]
pub trait SourceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Collect this provider's channel set. Must not fail the run: network
    /// and file problems degrade to a partial or empty contribution.
    async fn collect(&self) -> Contribution;
}
