//! Fan-out over every configured source and merge into one snapshot.

use crate::errors::Result;
use crate::models::{FundingRecord, Snapshot};
use crate::sources::Source;
use crate::utils::now_millis;
use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// Anything that can produce the current funding snapshot.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> Snapshot;
}

/// Concurrent collector over the source registry.
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: reqwest::Client,
    sources: Vec<Source>,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(sources: Vec<Source>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("funding-arb-watcher/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            sources,
            timeout,
        })
    }

    /// One aggregation pass. Never fails; a pass where every source failed is
    /// an empty snapshot.
    pub async fn collect(&self) -> Snapshot {
        let now = now_millis();
        let snapshot = gather(
            self.sources
                .iter()
                .map(|s| s.fetch(&self.client, self.timeout, now)),
        )
        .await;
        info!(
            sources = self.sources.len(),
            records = snapshot.len(),
            "[AGG] snapshot collected"
        );
        snapshot
    }
}

#[async_trait]
impl SnapshotSource for Aggregator {
    async fn snapshot(&self) -> Snapshot {
        self.collect().await
    }
}

/// Await every fetch concurrently, concatenate, and sort by APR.
pub async fn gather<I, F>(fetches: I) -> Snapshot
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Vec<FundingRecord>>,
{
    let batches = join_all(fetches).await;
    Snapshot::from_records(batches.into_iter().flatten().collect())
}

/// Fixed snapshot, for replaying captured data through the detector and watcher.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshot(pub Snapshot);

#[async_trait]
impl SnapshotSource for StaticSnapshot {
    async fn snapshot(&self) -> Snapshot {
        self.0.clone()
    }
}
